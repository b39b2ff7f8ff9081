//! HTTP fetcher implementation

use crate::config::FetchConfig;
use crate::fetch::FetchError;
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Per-call fetch options supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Overrides the configured per-request timeout
    pub timeout: Option<Duration>,

    /// CSS selector to wait for before capturing the page. The plain HTTP
    /// path cannot honor this; when set, the response carries
    /// `dynamic_content_unsupported = true` so the caller is informed.
    pub wait_for_selector: Option<String>,
}

/// Raw bytes retrieved for a URL, before normalization
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value, if present
    pub content_type: Option<String>,

    /// Response body
    pub body: Vec<u8>,

    /// When the response was received
    pub fetched_at: DateTime<Utc>,

    /// Set when the caller asked for rendered-DOM waiting that this
    /// retrieval path cannot provide
    pub dynamic_content_unsupported: bool,
}

/// HTTP fetcher with retry and redirect handling
///
/// Stateless across calls apart from connection reuse inside the underlying
/// client; safe to share behind an `Arc`.
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    /// Builds a fetcher from the given configuration
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(Policy::limited(config.max_redirects as usize))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self { client, config })
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Timeout | Retry up to `max_retries` with exponential backoff |
    /// | HTTP 5xx | Retry up to `max_retries` with exponential backoff |
    /// | HTTP 4xx | Immediate failure, never retried |
    /// | DNS / connection refused | Immediate failure |
    /// | Redirect limit exceeded | Immediate failure |
    ///
    /// Backoff doubles from `retry_base_delay` per attempt with ±20% jitter.
    pub async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<RawResponse, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            match self.fetch_once(url, options).await {
                Ok(response) => return Ok(response),
                Err(error) if error.is_transient() && attempt < self.config.max_retries => {
                    let delay = retry_delay(self.config.retry_base_delay, attempt);
                    tracing::debug!(
                        "transient failure for {} (attempt {}): {}; retrying in {:?}",
                        url,
                        attempt + 1,
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    tracing::debug!("fetch failed for {}: {}", url, error);
                    return Err(error);
                }
            }
        }
    }

    /// Performs a single fetch attempt without retries
    async fn fetch_once(
        &self,
        url: &Url,
        options: &FetchOptions,
    ) -> Result<RawResponse, FetchError> {
        let dynamic_content_unsupported = match &options.wait_for_selector {
            Some(selector) => {
                tracing::debug!(
                    "wait_for selector {:?} requested for {} but plain HTTP fetch cannot render",
                    selector,
                    url
                );
                true
            }
            None => false,
        };

        let mut request = self.client.get(url.clone());
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(length) = response.content_length() {
            if length > self.config.max_content_size as u64 {
                return Err(FetchError::BodyTooLarge {
                    url: url.to_string(),
                    max: self.config.max_content_size,
                });
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        if body.len() > self.config.max_content_size {
            return Err(FetchError::BodyTooLarge {
                url: url.to_string(),
                max: self.config.max_content_size,
            });
        }

        tracing::debug!("fetched {} bytes from {} ({})", body.len(), url, status);

        Ok(RawResponse {
            url: final_url,
            status_code: status.as_u16(),
            content_type,
            body: body.to_vec(),
            fetched_at: Utc::now(),
            dynamic_content_unsupported,
        })
    }
}

/// Maps a reqwest error onto the engine's fetch error taxonomy
fn classify_reqwest_error(url: &Url, error: reqwest::Error) -> FetchError {
    let url_string = url.to_string();

    if error.is_timeout() {
        return FetchError::Timeout { url: url_string };
    }

    if error.is_redirect() {
        return FetchError::TooManyRedirects { url: url_string };
    }

    if error.is_connect() {
        // reqwest folds DNS failures into connect errors; inspect the source
        // chain to tell them apart
        let chain = error_chain(&error);
        if chain.contains("dns") || chain.contains("resolve") {
            return FetchError::Dns { url: url_string };
        }
        return FetchError::ConnectionRefused { url: url_string };
    }

    if let Some(status) = error.status() {
        return FetchError::Http {
            url: url_string,
            status: status.as_u16(),
        };
    }

    FetchError::Transport {
        url: url_string,
        message: error.to_string(),
    }
}

/// Renders the full source chain of an error, lowercased, for classification
fn error_chain(error: &reqwest::Error) -> String {
    let mut chain = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        chain.push_str(": ");
        chain.push_str(&inner.to_string());
        source = inner.source();
    }
    chain.to_ascii_lowercase()
}

/// Exponential backoff with ±20% jitter
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let backoff = base.as_millis() as f64 * 2f64.powi(attempt as i32);
    let jitter = rand::thread_rng().gen_range(0.8..=1.2);
    Duration::from_millis((backoff * jitter).round() as u64)
}
