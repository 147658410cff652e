use crate::error::Error;
use url::Url;

/// Schemes accepted for scraping
const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Check that a raw string names a scrapeable http(s) URL.
///
/// Input without an explicit scheme is checked as its `https://` form, the
/// same form [`normalize`] produces, so `example.com/docs` is accepted.
pub fn validate(raw: &str) -> Result<(), Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("URL is required".to_string()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else if has_foreign_scheme(trimmed) {
        return Err(Error::InvalidUrl(
            "Only http and https URLs are supported".to_string(),
        ));
    } else {
        normalize(trimmed)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| Error::InvalidUrl(format!("Invalid URL format: {}", e)))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(Error::InvalidUrl(
            "Only http and https URLs are supported".to_string(),
        ));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(Error::InvalidUrl("Invalid URL format: missing host".to_string())),
    }
}

/// Whether scheme-less-looking input such as `mailto:a@b.c` or `file:/etc`
/// already names a non-http scheme.
///
/// `host:port` input (`localhost:8080`, `example.com:80/x`) does not count.
fn has_foreign_scheme(input: &str) -> bool {
    let Ok(url) = Url::parse(input) else {
        return false;
    };
    if ALLOWED_SCHEMES.contains(&url.scheme()) {
        return false;
    }

    let Some((scheme, rest)) = input.split_once(':') else {
        return false;
    };
    let looks_like_host = scheme.contains('.');
    let looks_like_port = rest.starts_with(|c: char| c.is_ascii_digit());
    !(looks_like_host || looks_like_port)
}

/// Trim the input and prepend `https://` when no http(s) scheme is present
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Resolve an attribute value (`href`, `src`) against the page it came from.
///
/// Empty values stay empty; values that cannot be joined are kept verbatim.
pub fn absolutize(base: &Url, reference: &str) -> String {
    let reference = reference.trim();
    if reference.is_empty() {
        return String::new();
    }

    match base.join(reference) {
        Ok(resolved) => resolved.to_string(),
        Err(e) => {
            ::log::trace!("Keeping unresolvable reference {:?}: {}", reference, e);
            reference.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty() {
        for raw in ["", "   ", "\n\t"] {
            match validate(raw) {
                Err(Error::InvalidUrl(reason)) => assert!(!reason.is_empty()),
                other => panic!("expected InvalidUrl for {:?}, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_validate_rejects_other_schemes() {
        for raw in [
            "ftp://example.com/file",
            "file:///etc/passwd",
            "ws://example.com",
            "mailto:user@example.com",
            "file:/etc/passwd",
            "javascript:alert(1)",
            "data:text/html,hello",
        ] {
            let err = validate(raw).unwrap_err();
            assert!(err.to_string().contains("http"), "{}", err);
        }
    }

    #[test]
    fn test_validate_rejects_malformed() {
        for raw in ["http://", "not a url", "https://exa mple.com", "http://[::1"] {
            match validate(raw) {
                Err(Error::InvalidUrl(reason)) => assert!(!reason.is_empty()),
                other => panic!("expected InvalidUrl for {:?}, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_validate_accepts_http_and_schemeless() {
        assert!(validate("https://example.com").is_ok());
        assert!(validate("http://example.com/path?q=1").is_ok());
        assert!(validate("  example.com/docs  ").is_ok());
        assert!(validate("localhost:8080").is_ok());
        assert!(validate("example.com:8443/admin").is_ok());
    }

    #[test]
    fn test_normalize_prepends_https() {
        assert_eq!(normalize("example.com"), "https://example.com");
        assert_eq!(normalize("  www.example.com/a  "), "https://www.example.com/a");
        assert_eq!(normalize("http://example.com"), "http://example.com");
        assert_eq!(normalize("HTTPS://Example.com"), "HTTPS://Example.com");
    }

    #[test]
    fn test_absolutize() {
        let base = Url::parse("https://example.com/docs/page.html").unwrap();
        assert_eq!(absolutize(&base, "/about"), "https://example.com/about");
        assert_eq!(absolutize(&base, "next.html"), "https://example.com/docs/next.html");
        assert_eq!(absolutize(&base, "//cdn.example.com/a.png"), "https://cdn.example.com/a.png");
        assert_eq!(absolutize(&base, "https://other.org/x"), "https://other.org/x");
        assert_eq!(absolutize(&base, ""), "");
    }
}
