//! SQLite storage backend

use crate::normalize::NormalizedDocument;
use crate::store::schema::initialize_schema;
use crate::store::tokens::rank_pages;
use crate::store::{PageStore, SearchHit, StoreError, StoredPage};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use url::Url;

/// Durable page store backed by SQLite
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates a database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better write throughput
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

impl PageStore for SqliteStore {
    fn put(&self, page: StoredPage) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let links = serde_json::to_string(
            &page
                .document
                .links
                .iter()
                .map(|u| u.as_str())
                .collect::<Vec<_>>(),
        )
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Replace any previous record for this (crawl, URL); the token rows
        // of a replaced page are removed by the cascading delete
        tx.execute(
            "DELETE FROM pages WHERE crawl_id = ?1 AND url = ?2",
            params![page.crawl_id, page.document.url.as_str()],
        )?;

        tx.execute(
            "INSERT INTO pages
                (crawl_id, url, fetched_at, status_code, title, content_type,
                 markdown, html, body_text, links, dynamic_unsupported, token_total)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                page.crawl_id,
                page.document.url.as_str(),
                page.document.fetched_at.to_rfc3339(),
                page.document.status_code,
                page.document.title,
                page.document.content_type,
                page.document.markdown,
                page.document.html,
                page.document.text,
                links,
                page.document.dynamic_content_unsupported,
                page.token_total,
            ],
        )?;

        let page_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO page_tokens (page_id, token, count) VALUES (?1, ?2, ?3)",
            )?;
            for (token, count) in &page.tokens {
                stmt.execute(params![page_id, token, count])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get(&self, crawl_id: &str, url: &str) -> Result<Option<StoredPage>, StoreError> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                "SELECT id, crawl_id, url, fetched_at, status_code, title, content_type,
                        markdown, html, body_text, links, dynamic_unsupported, token_total
                 FROM pages WHERE crawl_id = ?1 AND url = ?2",
                params![crawl_id, url],
                |row| Ok((row.get::<_, i64>(0)?, row_to_parts(row)?)),
            )
            .optional()?;

        match row {
            Some((page_id, parts)) => {
                let tokens = load_tokens(&conn, page_id)?;
                Ok(Some(parts.into_page(tokens)?))
            }
            None => Ok(None),
        }
    }

    fn search(
        &self,
        crawl_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, crawl_id, url, fetched_at, status_code, title, content_type,
                    markdown, html, body_text, links, dynamic_unsupported, token_total
             FROM pages WHERE crawl_id = ?1",
        )?;

        let rows = stmt.query_map(params![crawl_id], |row| {
            Ok((row.get::<_, i64>(0)?, row_to_parts(row)?))
        })?;

        let mut pages = Vec::new();
        for row in rows {
            let (page_id, parts) = row?;
            let tokens = load_tokens(&conn, page_id)?;
            pages.push(parts.into_page(tokens)?);
        }

        Ok(rank_pages(pages, query, limit))
    }

    fn page_count(&self, crawl_id: &str) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE crawl_id = ?1",
            params![crawl_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Column values of a page row before URL/timestamp parsing
struct PageParts {
    crawl_id: String,
    url: String,
    fetched_at: String,
    status_code: u16,
    title: Option<String>,
    content_type: Option<String>,
    markdown: String,
    html: String,
    body_text: String,
    links: String,
    dynamic_unsupported: bool,
    token_total: u32,
}

fn row_to_parts(row: &Row<'_>) -> Result<PageParts, rusqlite::Error> {
    Ok(PageParts {
        crawl_id: row.get(1)?,
        url: row.get(2)?,
        fetched_at: row.get(3)?,
        status_code: row.get(4)?,
        title: row.get(5)?,
        content_type: row.get(6)?,
        markdown: row.get(7)?,
        html: row.get(8)?,
        body_text: row.get(9)?,
        links: row.get(10)?,
        dynamic_unsupported: row.get(11)?,
        token_total: row.get(12)?,
    })
}

impl PageParts {
    fn into_page(self, tokens: HashMap<String, u32>) -> Result<StoredPage, StoreError> {
        let url = Url::parse(&self.url)
            .map_err(|e| StoreError::Serialization(format!("bad stored URL: {}", e)))?;

        let fetched_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&self.fetched_at)
            .map_err(|e| StoreError::Serialization(format!("bad stored timestamp: {}", e)))?
            .with_timezone(&Utc);

        let link_strings: Vec<String> = serde_json::from_str(&self.links)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let links = link_strings
            .iter()
            .filter_map(|s| Url::parse(s).ok())
            .collect();

        Ok(StoredPage {
            crawl_id: self.crawl_id,
            document: NormalizedDocument {
                url,
                fetched_at,
                status_code: self.status_code,
                markdown: self.markdown,
                html: self.html,
                text: self.body_text,
                links,
                title: self.title,
                content_type: self.content_type,
                dynamic_content_unsupported: self.dynamic_unsupported,
            },
            tokens,
            token_total: self.token_total,
        })
    }
}

fn load_tokens(conn: &Connection, page_id: i64) -> Result<HashMap<String, u32>, StoreError> {
    let mut stmt = conn.prepare("SELECT token, count FROM page_tokens WHERE page_id = ?1")?;
    let rows = stmt.query_map(params![page_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
    })?;

    let mut tokens = HashMap::new();
    for row in rows {
        let (token, count) = row?;
        tokens.insert(token, count);
    }
    Ok(tokens)
}
