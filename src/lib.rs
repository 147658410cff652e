pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod parsers;
pub mod results;
pub mod server;
pub mod service;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::ScraperConfig;
pub use error::{Error, Phase};
pub use results::{ScrapeOutcome, ScrapeResult, Strategy};

use crawlers::{FetchOutcome, Fetcher, InteractiveRenderer, ScrapeState, StaticFetcher};
use std::path::Path;

/// Builder and entry point for scraping a single URL.
///
/// Every scrape renders the page in a browser first and falls back to a
/// static fetch when rendering fails. A result is produced for any input.
#[derive(Debug, Clone, Default)]
pub struct Scraper {
    config: ScraperConfig,
}

impl Scraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    /// Apply a configuration
    pub fn with_config(mut self, config: ScraperConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file<P: AsRef<Path>>(
        mut self,
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        self.config = ScraperConfig::from_file(path)?;
        Ok(self)
    }

    /// Apply configuration from a JSON string
    pub fn with_config_str(mut self, json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        self.config = ScraperConfig::from_json(json)?;
        Ok(self)
    }

    pub fn with_max_sections(mut self, value: usize) -> Self {
        self.config.max_sections = value;
        self
    }

    pub fn with_max_scrolls(mut self, value: u32) -> Self {
        self.config.max_scrolls = value;
        self
    }

    pub fn with_max_pages(mut self, value: usize) -> Self {
        self.config.max_pages = value;
        self
    }

    /// Override the WebDriver server used for rendering
    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.config.webdriver_url = url.into();
        self
    }

    /// Override the static request timeout
    pub fn with_request_timeout(mut self, seconds: u64) -> Self {
        self.config.request_timeout_secs = seconds;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape `url`, rendering first and falling back to a static fetch
    pub async fn scrape(&self, url: &str) -> ScrapeOutcome {
        let fallback = StaticFetcher::new(self.config.clone());
        let renderer = InteractiveRenderer::new(self.config.clone(), fallback);
        self.scrape_with(url, &renderer).await
    }

    /// Scrape `url` with a specific fetch path
    pub async fn scrape_with<F: Fetcher>(&self, url: &str, fetcher: &F) -> ScrapeOutcome {
        let start = std::time::Instant::now();
        ::log::info!("Scraping {} (trying {} first)", url, fetcher.strategy());

        let outcome = fetcher.fetch(url, ScrapeState::for_url(url)).await;
        let scraped = assemble(url, outcome);

        ::log::info!(
            "Scraped {} with {} strategy: {} sections, {} errors in {:.2} seconds",
            url,
            scraped.strategy,
            scraped.result.sections.len(),
            scraped.result.errors.len(),
            start.elapsed().as_secs_f64()
        );

        scraped
    }
}

/// Builds the final result from whatever the fetch path produced
fn assemble(url: &str, outcome: FetchOutcome) -> ScrapeOutcome {
    let FetchOutcome {
        meta,
        sections,
        strategy,
        state,
    } = outcome;

    ScrapeOutcome {
        result: ScrapeResult {
            url: url.to_string(),
            scraped_at: utils::utc_timestamp(),
            meta,
            sections,
            interactions: state.interactions,
            errors: state.errors,
        },
        strategy,
    }
}
