
use crate::config::ScraperConfig;
use crate::parsers::Extractor;

pub(super) const SOURCE_URL: &str = "https://example.com/blog/post";

/// Extractor over `SOURCE_URL` with default limits
pub(super) fn extractor() -> Extractor {
    Extractor::new(SOURCE_URL, &ScraperConfig::default())
}

/// Extractor over `SOURCE_URL` with custom limits
pub(super) fn extractor_with(max_sections: usize, max_raw_html_length: usize) -> Extractor {
    let config = ScraperConfig {
        max_sections,
        max_raw_html_length,
        ..ScraperConfig::default()
    };
    Extractor::new(SOURCE_URL, &config)
}
