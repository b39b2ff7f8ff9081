//! Engine configuration types
//!
//! Configuration arrives as explicit structs from the embedding host; the
//! engine never reads environment variables or config files itself.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub fetch: FetchConfig,
    pub frontier: FrontierConfig,
}

/// HTTP fetch behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Total per-request timeout
    pub timeout: Duration,

    /// Connection establishment timeout
    pub connect_timeout: Duration,

    /// Maximum redirect hops before the fetch fails
    pub max_redirects: u32,

    /// Retry budget for transient failures (timeout, HTTP 5xx)
    pub max_retries: u32,

    /// Base delay for exponential retry backoff
    pub retry_base_delay: Duration,

    /// Maximum response body size in bytes
    pub max_content_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("seine/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 5,
            max_retries: 2,
            retry_base_delay: Duration::from_millis(250),
            max_content_size: 10 * 1024 * 1024,
        }
    }
}

impl FetchConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }
}

/// Crawl scheduling behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierConfig {
    /// Size of the worker pool draining the frontier queue
    pub workers: usize,

    /// Maximum in-flight requests per host
    pub per_host_concurrency: usize,

    /// Minimum delay between request dispatches to the same host
    pub per_host_delay: Duration,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            per_host_concurrency: 2,
            per_host_delay: Duration::ZERO,
        }
    }
}

impl FrontierConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_per_host_concurrency(mut self, limit: usize) -> Self {
        self.per_host_concurrency = limit.max(1);
        self
    }

    pub fn with_per_host_delay(mut self, delay: Duration) -> Self {
        self.per_host_delay = delay;
        self
    }
}
