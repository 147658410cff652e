use md5::{Digest, Md5};
use regex::Regex;
use std::sync::LazyLock;

/// Appended to raw HTML that was cut short
pub const TRUNCATION_MARKER: &str = "...";

static DOT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\.{3,}\s*").unwrap());
static DASH_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*-\s*-[\s-]*").unwrap());

/// Stable section id: `section-` plus the first 8 hex chars of the label's MD5
pub fn section_id(label: &str) -> String {
    let digest = Md5::digest(label.as_bytes());
    format!("section-{}", &hex::encode(digest)[..8])
}

/// Truncate serialized HTML to at most `max_length` bytes, cutting after the
/// last `>` inside the limit, and append [`TRUNCATION_MARKER`].
///
/// Returns the (possibly unchanged) HTML and whether it was cut.
pub fn truncate_html(html: &str, max_length: usize) -> (String, bool) {
    if html.len() <= max_length {
        return (html.to_string(), false);
    }

    let mut end = max_length;
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    let mut truncated = &html[..end];

    if let Some(last_tag) = truncated.rfind('>') {
        truncated = &truncated[..=last_tag];
    }

    (format!("{}{}", truncated, TRUNCATION_MARKER), true)
}

/// Collapse whitespace and strip runs of dots and repeated dashes
pub fn clean_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let without_dots = DOT_RUNS.replace_all(&collapsed, " ");
    let without_dashes = DASH_RUNS.replace_all(&without_dots, " ");
    without_dashes
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether extracted text is long enough to consider a page's content complete
pub fn estimate_text_completeness(text: &str, threshold: usize) -> bool {
    text.trim().chars().count() >= threshold
}

/// Current UTC time as an ISO 8601 string
pub fn utc_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// First `max_chars` characters of a string
pub fn take_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_id_is_deterministic() {
        let a = section_id("Pricing plans");
        let b = section_id("Pricing plans");
        assert_eq!(a, b);
        assert!(a.starts_with("section-"));
        assert_eq!(a.len(), "section-".len() + 8);
        assert!(a["section-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(section_id("Pricing plans"), section_id("Pricing"));
    }

    #[test]
    fn test_section_id_known_value() {
        // md5("Content") = f15c1cae7882448b3fb0404682e17e61
        assert_eq!(section_id("Content"), "section-f15c1cae");
    }

    #[test]
    fn test_truncate_html_short_input_unchanged() {
        let html = "<p>short</p>";
        let (out, truncated) = truncate_html(html, 100);
        assert_eq!(out, html);
        assert!(!truncated);
    }

    #[test]
    fn test_truncate_html_cuts_at_tag_boundary() {
        let html = "<div><p>first</p><p>second paragraph</p></div>";
        let (out, truncated) = truncate_html(html, 18);
        assert!(truncated);
        assert_eq!(out, "<div><p>first</p>...");
        assert!(out.len() <= 18 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_truncate_html_without_tag_boundary() {
        let (out, truncated) = truncate_html("abcdefghij", 4);
        assert!(truncated);
        assert_eq!(out, "abcd...");
    }

    #[test]
    fn test_truncate_html_respects_char_boundaries() {
        let html = "<p>ééééé</p>";
        let (out, truncated) = truncate_html(html, 6);
        assert!(truncated);
        assert_eq!(out, "<p>...");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Hello \n\t world  "), "Hello world");
        assert_eq!(clean_text("Loading..... done"), "Loading done");
        assert_eq!(clean_text("a -- b - - c"), "a b c");
        assert_eq!(clean_text("well-known"), "well-known");
    }

    #[test]
    fn test_estimate_text_completeness() {
        assert!(!estimate_text_completeness("  short  ", 100));
        assert!(estimate_text_completeness(&"x".repeat(100), 100));
    }
}
