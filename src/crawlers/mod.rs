pub mod crawler;
pub mod driver;
pub mod http;
pub mod interactions;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use crawler::{FetchOutcome, Fetcher, ScrapeState};
pub use http::StaticFetcher;
pub use web::InteractiveRenderer;
