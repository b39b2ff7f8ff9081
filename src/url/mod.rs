//! URL handling module
//!
//! This module provides URL normalization (the canonical form used for
//! frontier deduplication), host scoping, and include/exclude pattern
//! filtering for crawls.

mod normalize;
mod pattern;

pub use normalize::normalize_url;
pub use pattern::{glob_match, UrlFilter};

use url::Url;

/// Returns the host of a URL, if any, lowercased
pub fn host_of(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_ascii_lowercase())
}

/// Checks whether a candidate URL is in the same crawl scope as the seed
///
/// Scope is the seed's authority: same host and same effective port. Links
/// outside the scope are recorded in the document but never enqueued.
pub fn same_scope(seed: &Url, candidate: &Url) -> bool {
    host_of(seed) == host_of(candidate) && seed.port_or_known_default() == candidate.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of(&url("https://Example.COM/a")), Some("example.com".to_string()));
        assert_eq!(host_of(&url("http://127.0.0.1:8080/")), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_same_scope_same_host() {
        assert!(same_scope(
            &url("https://example.com/"),
            &url("https://example.com/deep/page")
        ));
    }

    #[test]
    fn test_same_scope_rejects_other_host() {
        assert!(!same_scope(
            &url("https://example.com/"),
            &url("https://other.com/")
        ));
        assert!(!same_scope(
            &url("https://example.com/"),
            &url("https://sub.example.com/")
        ));
    }

    #[test]
    fn test_same_scope_port_sensitive() {
        assert!(!same_scope(
            &url("http://127.0.0.1:8001/"),
            &url("http://127.0.0.1:8002/")
        ));
        // Explicit default port equals implicit
        assert!(same_scope(
            &url("https://example.com/"),
            &url("https://example.com:443/x")
        ));
    }
}
