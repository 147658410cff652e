pub mod html;
pub mod text;

#[cfg(test)]
mod tests;

use crate::config::ScraperConfig;
use crate::results::{Meta, ScrapeError, Section};
use scraper::Html;
use url::Url;

/// Result of extracting a document
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Page-level metadata
    pub meta: Meta,
    /// Sections in discovery order, capped at the configured maximum
    pub sections: Vec<Section>,
    /// Candidates that failed to build, one entry each
    pub errors: Vec<ScrapeError>,
}

impl ParseResult {
    /// Section texts joined with spaces
    pub fn page_text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.content.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Turns an HTML document into metadata and typed sections
#[derive(Debug, Clone)]
pub struct Extractor {
    source_url: String,
    base: Option<Url>,
    max_sections: usize,
    max_raw_html_length: usize,
}

impl Extractor {
    /// Creates an extractor for pages fetched from `source_url`
    pub fn new(source_url: &str, config: &ScraperConfig) -> Self {
        let base = match Url::parse(source_url) {
            Ok(url) => Some(url),
            Err(e) => {
                ::log::warn!("Source URL {} is not absolute: {}", source_url, e);
                None
            }
        };

        Self {
            source_url: source_url.to_string(),
            base,
            max_sections: config.max_sections,
            max_raw_html_length: config.max_raw_html_length,
        }
    }

    /// Parses and extracts an HTML string
    pub fn extract(&self, html: &str) -> ParseResult {
        let doc = Html::parse_document(html);
        self.extract_document(&doc)
    }

    /// Extracts an already parsed document
    pub fn extract_document(&self, doc: &Html) -> ParseResult {
        let meta = html::extract_metadata(doc, self.base.as_ref());

        let builder = html::SectionBuilder {
            source_url: &self.source_url,
            base: self.base.as_ref(),
            max_raw_html_length: self.max_raw_html_length,
        };

        let mut failures = Vec::new();
        let (mut sections, tier) = builder.segment(doc, &mut failures);

        if sections.len() > self.max_sections {
            ::log::debug!(
                "Capping {} sections at {} for {}",
                sections.len(),
                self.max_sections,
                self.source_url
            );
            sections.truncate(self.max_sections);
        }

        ::log::debug!(
            "Extracted {} sections from {} ({:?} tier, {} failed candidates)",
            sections.len(),
            self.source_url,
            tier,
            failures.len()
        );

        ParseResult {
            meta,
            sections,
            errors: failures.iter().filter_map(|e| e.record()).collect(),
        }
    }
}
