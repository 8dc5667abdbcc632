//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CrawlStore trait.

use crate::state::{EntryPath, Verify};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CrawlStore, StorageResult};
use crate::storage::{NormalizationRecord, QueueEntry};
use crate::MirrorError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

const ENTRY_COLUMNS: &str = "site, title, path, level, verify, attemptCount";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens the store at `path`, initializing the schema in place
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(MirrorError)` - Failed to open database
    pub fn open(path: &Path) -> Result<Self, MirrorError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates a fresh store at `path`
    ///
    /// An existing database file is renamed to `<name>.old` (or `<name>.old.N`
    /// if that is taken) first, never overwritten. Commits still sitting in
    /// its write-ahead log are checkpointed into the file before the move.
    pub fn create(path: &Path) -> Result<Self, MirrorError> {
        if path.exists() {
            checkpoint(path)?;

            let aside = aside_path(path);
            std::fs::rename(path, &aside)?;
            for suffix in ["-wal", "-shm"] {
                let leftover = sidecar(path, suffix);
                if leftover.exists() {
                    std::fs::rename(&leftover, sidecar(&aside, suffix))?;
                }
            }
            tracing::info!("Moved existing store {} to {}", path.display(), aside.display());
        }
        Self::open(path)
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> Result<Self, MirrorError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_entries(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<QueueEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map(params, row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// Folds the write-ahead log of the database at `path` back into the file
fn checkpoint(path: &Path) -> Result<(), MirrorError> {
    let conn = Connection::open(path)?;
    conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
    Ok(())
}

/// `<path><suffix>`, e.g. the `-wal` file of a database
fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// First free `<path>.old` / `<path>.old.N` name
fn aside_path(path: &Path) -> PathBuf {
    let base = path.as_os_str().to_owned();

    let mut candidate = base.clone();
    candidate.push(".old");
    let mut n = 1;
    while Path::new(&candidate).exists() {
        candidate = base.clone();
        candidate.push(format!(".old.{}", n));
        n += 1;
    }
    PathBuf::from(candidate)
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
    let path: Option<String> = row.get(2)?;
    Ok(QueueEntry {
        site: row.get(0)?,
        title: row.get(1)?,
        path: path.as_deref().map(EntryPath::from_db_string),
        level: row.get(3)?,
        verify: Verify::from_db_int(row.get(4)?),
        attempts: row.get(5)?,
    })
}

impl CrawlStore for SqliteStore {
    // ===== Keyed Map =====

    fn get(&self, site: &str, title: &str) -> StorageResult<Option<QueueEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE site = ?1 AND title = ?2",
                    ENTRY_COLUMNS
                ),
                params![site, title],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn put(&mut self, entry: &QueueEntry) -> StorageResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO pages ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                ENTRY_COLUMNS
            ),
            params![
                entry.site,
                entry.title,
                entry.path.as_ref().map(EntryPath::to_db_string),
                entry.level,
                entry.verify.to_db_int(),
                entry.attempts,
            ],
        )?;
        Ok(())
    }

    fn remove(&mut self, site: &str, title: &str) -> StorageResult<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM pages WHERE site = ?1 AND title = ?2",
            params![site, title],
        )?;
        Ok(deleted > 0)
    }

    fn scan_level(&self, level: i64) -> StorageResult<Vec<QueueEntry>> {
        self.query_entries(
            &format!(
                "SELECT {} FROM pages WHERE level = ?1 ORDER BY site, title",
                ENTRY_COLUMNS
            ),
            params![level],
        )
    }

    fn levels(&self) -> StorageResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT level FROM pages ORDER BY level")?;
        let levels = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(levels)
    }

    fn entries(&self) -> StorageResult<Vec<QueueEntry>> {
        self.query_entries(
            &format!("SELECT {} FROM pages ORDER BY site, title", ENTRY_COLUMNS),
            [],
        )
    }

    // ===== Normalizations =====

    fn record_normalization(&mut self, record: &NormalizationRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO normalized (oldTitle, newTitle, site) VALUES (?1, ?2, ?3)",
            params![record.old_title, record.new_title, record.site],
        )?;
        Ok(())
    }

    fn normalizations(&self) -> StorageResult<Vec<NormalizationRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT oldTitle, newTitle, site FROM normalized ORDER BY rowid")?;
        let records = stmt
            .query_map([], |row| {
                Ok(NormalizationRecord {
                    old_title: row.get(0)?,
                    new_title: row.get(1)?,
                    site: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    // ===== Queue Operations =====

    fn pending(&self, level: i64) -> StorageResult<Vec<QueueEntry>> {
        self.query_entries(
            &format!(
                "SELECT {} FROM pages WHERE level = ?1 AND path IS NULL AND verify = ?2 ORDER BY site, title",
                ENTRY_COLUMNS
            ),
            params![level, Verify::Confirmed.to_db_int()],
        )
    }

    fn pending_levels(&self) -> StorageResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT level FROM pages WHERE path IS NULL AND verify = ?1 ORDER BY level",
        )?;
        let levels = stmt
            .query_map(params![Verify::Confirmed.to_db_int()], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(levels)
    }

    fn confirm_level(&mut self, level: i64) -> StorageResult<usize> {
        let promoted = self.conn.execute(
            "UPDATE pages SET verify = ?1 WHERE level = ?2 AND path IS NULL AND verify = ?3",
            params![
                Verify::Confirmed.to_db_int(),
                level,
                Verify::Discovered.to_db_int()
            ],
        )?;
        Ok(promoted)
    }

    fn normalizations_at_level(&self, level: i64) -> StorageResult<Vec<NormalizationRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT n.oldTitle, n.newTitle, n.site FROM normalized n
             JOIN pages p ON p.site = n.site AND p.title = n.newTitle
             WHERE p.level = ?1
             ORDER BY n.rowid",
        )?;
        let records = stmt
            .query_map(params![level], |row| {
                Ok(NormalizationRecord {
                    old_title: row.get(0)?,
                    new_title: row.get(1)?,
                    site: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
