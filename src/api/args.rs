//! Operation arguments and results
//!
//! Typed argument objects for the four operations, with validation that
//! runs before any network or store access, and the structured results the
//! host layer marshals back to its own envelope.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Output rendering selected by a scrape call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeFormat {
    #[default]
    Markdown,
    Html,
    Text,
}

impl FromStr for ScrapeFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "text" => Ok(Self::Text),
            other => Err(ValidationError::UnknownFormat(other.to_string())),
        }
    }
}

/// Arguments for `scrape`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeArgs {
    pub url: String,

    #[serde(default)]
    pub format: ScrapeFormat,

    #[serde(default)]
    pub include_links: bool,

    /// CSS selector to wait for before capture (rendered-DOM paths only)
    #[serde(default)]
    pub wait_for: Option<String>,
}

impl ScrapeArgs {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ScrapeFormat::default(),
            include_links: false,
            wait_for: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        require_nonempty(&self.url, "url")
    }
}

/// Result of `scrape`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub url: String,

    /// The requested rendering
    pub text: String,

    /// Extracted links, present when `include_links` was set
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub links: Vec<String>,

    /// The caller asked for rendered-DOM waiting this path cannot provide
    pub dynamic_content_unsupported: bool,
}

/// Arguments for `crawl`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlArgs {
    pub url: String,

    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    #[serde(default)]
    pub include_patterns: Vec<String>,

    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_max_pages() -> usize {
    10
}

fn default_max_depth() -> u32 {
    2
}

impl CrawlArgs {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        require_nonempty(&self.url, "url")?;
        if self.max_pages == 0 {
            return Err(ValidationError::ZeroLimit);
        }
        Ok(())
    }
}

/// Result of `crawl`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Opaque identifier for querying this crawl's results
    pub crawl_id: String,

    /// One-line human-readable outcome, e.g.
    /// `completed: 4 pages fetched, 1 failed in 2.3s`
    pub status_summary: String,
}

/// Arguments for `extract`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractArgs {
    pub url: String,

    /// Field-name to type-descriptor mapping
    pub schema: Value,

    /// Optional natural-language guidance for the inference path
    #[serde(default)]
    pub prompt: Option<String>,
}

impl ExtractArgs {
    pub fn new(url: impl Into<String>, schema: Value) -> Self {
        Self {
            url: url.into(),
            schema,
            prompt: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        require_nonempty(&self.url, "url")?;
        if self.schema.is_null() {
            return Err(ValidationError::MissingArgument("schema"));
        }
        Ok(())
    }
}

/// Result of `extract`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResult {
    pub url: String,
    pub fields: BTreeMap<String, Value>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

/// Arguments for `search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    pub crawl_id: String,

    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

impl SearchArgs {
    pub fn new(query: impl Into<String>, crawl_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            crawl_id: crawl_id.into(),
            limit: default_limit(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        require_nonempty(&self.query, "query")?;
        require_nonempty(&self.crawl_id, "crawl_id")?;
        if self.limit == 0 {
            return Err(ValidationError::ZeroLimit);
        }
        Ok(())
    }
}

/// One entry in a search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultEntry {
    pub url: String,
    pub snippet: String,
    pub score: f32,
}

/// Result of `search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub results: Vec<SearchResultEntry>,
}

fn require_nonempty(value: &str, name: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingArgument(name))
    } else {
        Ok(())
    }
}
