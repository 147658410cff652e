use crate::error::Error;
use crate::parsers::ParseResult;
use crate::results::{Interactions, Meta, ScrapeError, Section, Strategy};
use async_trait::async_trait;

/// Interaction and error state threaded through every fetch attempt.
///
/// Owned by the orchestrator, moved into a fetcher and handed back inside
/// its [`FetchOutcome`], so nothing collected before a fallback is lost.
#[derive(Debug, Clone, Default)]
pub struct ScrapeState {
    pub interactions: Interactions,
    pub errors: Vec<ScrapeError>,
}

impl ScrapeState {
    /// State for a scrape of `url`, which is the first entry of `pages`
    pub fn for_url(url: &str) -> Self {
        let mut state = Self::default();
        state.interactions.pages.push(url.to_string());
        state
    }

    /// Record a non-fatal error
    pub fn record(&mut self, error: &Error) {
        match error.record() {
            Some(record) => {
                ::log::debug!("Recording {} error: {}", record.phase, error);
                self.errors.push(record);
            }
            None => ::log::debug!("Not recording caller error: {}", error),
        }
    }
}

/// What a fetcher produced for a URL
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub meta: Meta,
    pub sections: Vec<Section>,
    pub strategy: Strategy,
    /// Accumulated state, fetcher errors before extractor errors
    pub state: ScrapeState,
}

impl FetchOutcome {
    /// Outcome with default metadata and no sections
    pub fn empty(strategy: Strategy, state: ScrapeState) -> Self {
        Self {
            meta: Meta::default(),
            sections: Vec::new(),
            strategy,
            state,
        }
    }

    /// Merge an extraction into the accumulated state
    pub fn from_parse(parsed: ParseResult, strategy: Strategy, mut state: ScrapeState) -> Self {
        state.errors.extend(parsed.errors);
        Self {
            meta: parsed.meta,
            sections: parsed.sections,
            strategy,
            state,
        }
    }
}

/// Fetch-and-extract capability shared by the static and interactive paths.
///
/// Implementations never fail: problems are recorded in the returned state.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Strategy reported when this fetcher produces the sections itself
    fn strategy(&self) -> Strategy;

    /// Fetch `url`, extract it, and return the updated state
    async fn fetch(&self, url: &str, state: ScrapeState) -> FetchOutcome;
}
