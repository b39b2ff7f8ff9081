//! Database schema definitions
//!
//! This module contains the SQL schema for the SQLite storage backend.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Stored crawl results, one row per (crawl, URL)
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl_id TEXT NOT NULL,
    url TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    status_code INTEGER NOT NULL,
    title TEXT,
    content_type TEXT,
    markdown TEXT NOT NULL,
    html TEXT NOT NULL,
    body_text TEXT NOT NULL,
    links TEXT NOT NULL,
    dynamic_unsupported INTEGER NOT NULL DEFAULT 0,
    token_total INTEGER NOT NULL,
    UNIQUE(crawl_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_crawl ON pages(crawl_id);

-- Term index over the text rendering
CREATE TABLE IF NOT EXISTS page_tokens (
    page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    token TEXT NOT NULL,
    count INTEGER NOT NULL,
    UNIQUE(page_id, token)
);

CREATE INDEX IF NOT EXISTS idx_page_tokens_token ON page_tokens(token);
"#;

/// Creates all tables and indexes if they do not exist
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        // Idempotent
        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('pages', 'page_tokens')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }
}
