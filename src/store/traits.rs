//! Storage trait and error types

use crate::store::StoredPage;
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// A `StoreError` surfacing inside a running crawl escalates the job to
/// Failed; on direct calls it terminates the operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One search result with its relevance score
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub page: StoredPage,
    pub score: f32,
}

/// Trait for crawl-result storage backends
///
/// Implementations must be thread-safe; the frontier writes from its
/// coordinator task while callers read concurrently. Search is restricted
/// to pages belonging to the given crawl identifier; an unknown identifier
/// yields an empty result, not an error.
pub trait PageStore: Send + Sync {
    /// Persists a page; a page for the same (crawl, URL) pair replaces the
    /// previous record
    fn put(&self, page: StoredPage) -> Result<(), StoreError>;

    /// Looks up one page by crawl identifier and normalized URL
    fn get(&self, crawl_id: &str, url: &str) -> Result<Option<StoredPage>, StoreError>;

    /// Ranks stored pages of a crawl against a query
    ///
    /// Results are ordered by descending relevance score; ties break by
    /// ascending fetch timestamp (earlier pages first). At most `limit`
    /// hits are returned, and pages with zero relevance are omitted.
    fn search(&self, crawl_id: &str, query: &str, limit: usize)
        -> Result<Vec<SearchHit>, StoreError>;

    /// Number of pages stored for a crawl
    fn page_count(&self, crawl_id: &str) -> Result<usize, StoreError>;
}
