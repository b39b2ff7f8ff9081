//! Crawl result storage and search
//!
//! This module persists crawl results keyed by crawl identifier and page
//! URL, and answers query-time searches over the stored text renderings.
//! The backend is a trait: [`MemoryStore`] is the default, and
//! [`SqliteStore`] offers durable storage with the same semantics.

mod memory;
mod schema;
mod sqlite;
mod tokens;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use tokens::{make_snippet, token_counts, tokenize};
pub use traits::{PageStore, SearchHit, StoreError};

use crate::normalize::NormalizedDocument;
use std::collections::HashMap;

/// A persisted crawl result
///
/// Created when the frontier successfully processes an entry; never mutated
/// afterwards. Search-index tokens are derived from the text rendering at
/// creation time.
#[derive(Debug, Clone)]
pub struct StoredPage {
    /// Identifier of the crawl that produced this page
    pub crawl_id: String,

    /// The normalized document
    pub document: NormalizedDocument,

    /// Term counts over the text rendering
    pub tokens: HashMap<String, u32>,

    /// Total number of tokens in the text rendering
    pub token_total: u32,
}

impl StoredPage {
    /// Builds a stored page, deriving its search-index tokens
    pub fn new(crawl_id: String, document: NormalizedDocument) -> Self {
        let tokens = token_counts(&document.text);
        let token_total = tokens.values().sum();

        Self {
            crawl_id,
            document,
            tokens,
            token_total,
        }
    }
}
