use crate::results::ScrapeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

/// Pipeline step an error was recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Fetch,
    Render,
    Scroll,
    Parse,
    Pagination,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Fetch => "fetch",
            Phase::Render => "render",
            Phase::Scroll => "scroll",
            Phase::Parse => "parse",
            Phase::Pagination => "pagination",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised anywhere in the scrape pipeline
#[derive(Debug, ThisError)]
pub enum Error {
    /// Caller input rejected before any network activity
    #[error("{0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Fetch(String),

    #[error("{0}")]
    Render(String),

    #[error("Scroll error: {0}")]
    Scroll(String),

    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Pagination(String),

    #[error("timed out: {0}")]
    Timeout(String),
}

impl Error {
    /// Phase recorded for this error when it lands in a result's error list.
    ///
    /// `None` for caller input errors, which are rejected rather than recorded.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::InvalidUrl(_) => None,
            Error::Fetch(_) => Some(Phase::Fetch),
            Error::Render(_) | Error::Timeout(_) => Some(Phase::Render),
            Error::Scroll(_) => Some(Phase::Scroll),
            Error::Parse(_) => Some(Phase::Parse),
            Error::Pagination(_) => Some(Phase::Pagination),
        }
    }

    /// Converts into the non-fatal record kept in `ScrapeResult::errors`
    pub fn record(&self) -> Option<ScrapeError> {
        self.phase().map(|phase| ScrapeError::new(self.to_string(), phase))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Fetch(e.to_string())
    }
}

impl From<fantoccini::error::CmdError> for Error {
    fn from(e: fantoccini::error::CmdError) -> Self {
        Error::Render(e.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Parse(e.to_string())
    }
}
