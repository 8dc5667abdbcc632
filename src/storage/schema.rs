//! Database schema definitions
//!
//! Table and column names match stores written by earlier versions of the
//! mirroring tool, so an existing `wikiPages.db` opens in place.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Crawl queue, one row per (site, title)
CREATE TABLE IF NOT EXISTS pages (
    site TEXT NOT NULL,
    title TEXT NOT NULL,
    path TEXT,
    level INTEGER NOT NULL,
    verify INTEGER NOT NULL DEFAULT 0,
    attemptCount INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (site, title) ON CONFLICT REPLACE
);

CREATE INDEX IF NOT EXISTS idx_pages_level ON pages(level);

-- Titles the wiki resolved to a different canonical title
CREATE TABLE IF NOT EXISTS normalized (
    oldTitle TEXT NOT NULL,
    newTitle TEXT NOT NULL,
    site TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_normalized_new ON normalized(site, newTitle);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
