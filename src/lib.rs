//! Seine: a web crawling and content-extraction engine
//!
//! This crate implements the core of a scraping service: single-page scraping,
//! breadth-first site crawling with politeness limits, schema-driven structured
//! extraction, and term-frequency search over stored crawl results. The four
//! operations are exposed as plain async calls on [`api::Engine`] so any host
//! layer (CLI, RPC server, tool registry) can bind them to its own transport.

pub mod api;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod frontier;
pub mod normalize;
pub mod store;
pub mod url;

use thiserror::Error;

/// Main error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("fetch error: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("schema error: {0}")]
    Schema(#[from] extract::SchemaError),

    #[error("store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Argument errors, raised before any network or store access
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("unknown format {0:?} (expected markdown, html, or text)")]
    UnknownFormat(String),

    #[error("limit must be greater than zero")]
    ZeroLimit,
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

// Re-export commonly used types
pub use api::{CrawlArgs, Engine, ExtractArgs, ScrapeArgs, SearchArgs};
pub use config::EngineConfig;
pub use frontier::{CrawlJob, CrawlSummary, JobStatus};
pub use normalize::NormalizedDocument;
pub use store::{PageStore, StoredPage};
