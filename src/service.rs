//! Request handling shared by the CLI and the HTTP server.

use crate::results::{ScrapeResult, Strategy};
use crate::{Error, Scraper, filter, utils};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

/// Successful scrape, with the strategy used and the wall time in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub result: ScrapeResult,
    pub strategy: Strategy,
    pub processing_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn current() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: utils::utc_timestamp(),
        }
    }
}

/// Failures surfaced to the caller of a scrape request
#[derive(Debug, ThisError)]
pub enum ServiceError {
    /// The URL was rejected before anything was fetched
    #[error("{0}")]
    BadRequest(String),

    /// Something outside the pipeline's own fallbacks went wrong
    #[error("Scraping failed: {0}")]
    Internal(String),
}

impl From<Error> for ServiceError {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidUrl(reason) => ServiceError::BadRequest(reason),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

/// Validate, normalize and scrape the requested URL
pub async fn handle_scrape(
    scraper: &Scraper,
    request: ScrapeRequest,
) -> Result<ScrapeResponse, ServiceError> {
    let start = std::time::Instant::now();

    filter::validate(&request.url)?;
    let url = filter::normalize(&request.url);

    // A panic inside the pipeline must not take the caller down with it
    let task_scraper = scraper.clone();
    let task_url = url.clone();
    let scraped = tokio::spawn(async move { task_scraper.scrape(&task_url).await })
        .await
        .map_err(|e| {
            ::log::error!("Scrape task for {} did not complete: {}", url, e);
            ServiceError::Internal(e.to_string())
        })?;

    Ok(ScrapeResponse {
        strategy: scraped.strategy,
        result: scraped.result,
        processing_time: start.elapsed().as_secs_f64(),
    })
}
