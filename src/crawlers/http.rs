use crate::config::ScraperConfig;
use crate::crawlers::crawler::{FetchOutcome, Fetcher, ScrapeState};
use crate::error::Error;
use crate::parsers::{Extractor, ParseResult};
use crate::results::Strategy;
use crate::utils::estimate_text_completeness;
use async_trait::async_trait;
use reqwest::Client;

/// Fetches a page with a single GET and extracts it without a browser.
///
/// The HTTP client is built per fetch, so a client that cannot be built is
/// reported as a fetch error like any other transport failure.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    config: ScraperConfig,
}

impl StaticFetcher {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    fn client(&self) -> Result<Client, Error> {
        let client = Client::builder()
            .user_agent(self.config.user_agent.clone())
            .timeout(self.config.request_timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(client)
    }

    /// GET the page body, treating non-2xx statuses as failures
    async fn get(&self, url: &str) -> Result<String, Error> {
        let response = self.client()?.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        Ok(body)
    }

    /// Parse and extract a body that has already been fetched
    pub fn extract(&self, url: &str, body: &str) -> ParseResult {
        Extractor::new(url, &self.config).extract(body)
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    fn strategy(&self) -> Strategy {
        Strategy::Static
    }

    async fn fetch(&self, url: &str, mut state: ScrapeState) -> FetchOutcome {
        let start = std::time::Instant::now();
        ::log::info!("Static fetch: {}", url);

        let body = match self.get(url).await {
            Ok(body) => body,
            Err(e) => {
                ::log::error!("Failed to fetch {}: {}", url, e);
                state.record(&e);
                return FetchOutcome::empty(Strategy::Static, state);
            }
        };

        let parsed = self.extract(url, &body);

        let page_text = parsed.page_text();
        if !estimate_text_completeness(&page_text, self.config.use_js_threshold) {
            ::log::warn!(
                "Static content of {} looks incomplete ({} chars of text)",
                url,
                page_text.chars().count()
            );
        }

        ::log::debug!(
            "Static fetch of {} produced {} sections in {:.2} seconds",
            url,
            parsed.sections.len(),
            start.elapsed().as_secs_f64()
        );

        FetchOutcome::from_parse(parsed, Strategy::Static, state)
    }
}
