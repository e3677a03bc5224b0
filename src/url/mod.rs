//! URL handling module for Website Checker
//!
//! This module provides link normalization, base-domain extraction and the
//! internal/external classification used to keep the crawl on one site.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{base_domain, extract_host, is_internal};
pub use normalize::normalize;

/// Strips a single trailing slash from a URL string
///
/// Used wherever two URLs have to be compared as pages: `https://a.test/x`
/// and `https://a.test/x/` name the same page.
pub fn strip_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

/// Returns true if both URLs are equal after stripping a single trailing slash
pub fn same_url(a: &str, b: &str) -> bool {
    strip_trailing_slash(a) == strip_trailing_slash(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_single_trailing_slash() {
        assert_eq!(strip_trailing_slash("https://a.test/x/"), "https://a.test/x");
        assert_eq!(strip_trailing_slash("https://a.test/x"), "https://a.test/x");
    }

    #[test]
    fn test_strip_only_one_slash() {
        assert_eq!(strip_trailing_slash("https://a.test/x//"), "https://a.test/x/");
    }

    #[test]
    fn test_same_url() {
        assert!(same_url("https://a.test", "https://a.test/"));
        assert!(same_url("https://a.test/x/", "https://a.test/x"));
        assert!(!same_url("https://a.test/x", "https://a.test/y"));
    }
}
