//! In-memory storage backend
//!
//! The default store: crawl results live in a process-local map. Suitable
//! for embedded use and tests; durable storage uses [`crate::store::SqliteStore`].

use crate::store::tokens::rank_pages;
use crate::store::{PageStore, SearchHit, StoreError, StoredPage};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Process-local page store
#[derive(Default)]
pub struct MemoryStore {
    // crawl_id -> url -> page; BTreeMap keeps per-crawl iteration stable
    inner: Mutex<HashMap<String, BTreeMap<String, StoredPage>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageStore for MemoryStore {
    fn put(&self, page: StoredPage) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;

        inner
            .entry(page.crawl_id.clone())
            .or_default()
            .insert(page.document.url.as_str().to_string(), page);

        Ok(())
    }

    fn get(&self, crawl_id: &str, url: &str) -> Result<Option<StoredPage>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;

        Ok(inner
            .get(crawl_id)
            .and_then(|pages| pages.get(url))
            .cloned())
    }

    fn search(
        &self,
        crawl_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;

        let pages: Vec<StoredPage> = inner
            .get(crawl_id)
            .map(|pages| pages.values().cloned().collect())
            .unwrap_or_default();

        Ok(rank_pages(pages, query, limit))
    }

    fn page_count(&self, crawl_id: &str) -> Result<usize, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;

        Ok(inner.get(crawl_id).map(|pages| pages.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{at, page};

    #[test]
    fn test_put_and_get() {
        let store = MemoryStore::new();
        store
            .put(page("c1", "https://example.com/", "hello world", at(0)))
            .unwrap();

        let found = store.get("c1", "https://example.com/").unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().document.text, "hello world");

        assert!(store.get("c1", "https://example.com/other").unwrap().is_none());
        assert!(store.get("c2", "https://example.com/").unwrap().is_none());
    }

    #[test]
    fn test_search_scoped_to_crawl() {
        let store = MemoryStore::new();
        store.put(page("c1", "https://a.test/", "rust crawler", at(0))).unwrap();
        store.put(page("c2", "https://b.test/", "rust crawler", at(0))).unwrap();

        let hits = store.search("c1", "rust", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].page.crawl_id, "c1");
    }

    #[test]
    fn test_search_unknown_crawl_is_empty() {
        let store = MemoryStore::new();
        assert!(store.search("missing", "anything", 10).unwrap().is_empty());
    }

    #[test]
    fn test_page_count() {
        let store = MemoryStore::new();
        assert_eq!(store.page_count("c1").unwrap(), 0);

        store.put(page("c1", "https://a.test/", "x", at(0))).unwrap();
        store.put(page("c1", "https://b.test/", "y", at(1))).unwrap();
        // Same URL replaces, not duplicates
        store.put(page("c1", "https://a.test/", "z", at(2))).unwrap();

        assert_eq!(store.page_count("c1").unwrap(), 2);
    }
}
