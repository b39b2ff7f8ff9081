//! HTTP fetch layer
//!
//! This module handles all network retrieval for the engine, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with timeout and redirect limits
//! - Retry logic with exponential backoff for transient failures
//! - Error classification into a stable taxonomy

mod client;

pub use client::{Fetcher, FetchOptions, RawResponse};

use thiserror::Error;

/// Errors from the network fetch layer
///
/// `Timeout` and 5xx `Http` errors are transient and retried by
/// [`Fetcher::fetch`]; every other variant is terminal.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timeout for {url}")]
    Timeout { url: String },

    #[error("DNS resolution failed for {url}")]
    Dns { url: String },

    #[error("connection refused for {url}")]
    ConnectionRefused { url: String },

    #[error("too many redirects from {url}")]
    TooManyRedirects { url: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("response body for {url} exceeds {max} bytes")]
    BodyTooLarge { url: String, max: usize },

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl FetchError {
    /// Returns true if a retry may succeed (timeout or server error)
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let url = "https://example.com/".to_string();

        assert!(FetchError::Timeout { url: url.clone() }.is_transient());
        assert!(FetchError::Http {
            url: url.clone(),
            status: 503
        }
        .is_transient());

        assert!(!FetchError::Http {
            url: url.clone(),
            status: 404
        }
        .is_transient());
        assert!(!FetchError::Http {
            url: url.clone(),
            status: 429
        }
        .is_transient());
        assert!(!FetchError::ConnectionRefused { url: url.clone() }.is_transient());
        assert!(!FetchError::Dns { url: url.clone() }.is_transient());
        assert!(!FetchError::TooManyRedirects { url }.is_transient());
    }
}
