//! Storage traits and error types
//!
//! This module defines the keyed-map interface a crawl store has to offer and
//! the queue operations derived from it.

use crate::state::{QueueStatus, Verify};
use crate::storage::{Lookup, NormalizationRecord, QueueEntry};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row cannot be interpreted
    #[error("Corrupt store: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A persistent map from `(site, title)` to queue entries
///
/// Implementations provide the primitive map operations; the queue semantics
/// (`lookup`, `enqueue`, `pending`, ...) are derived from them and may be
/// overridden with cheaper engine-specific versions. Every mutation is
/// durable once it returns.
pub trait CrawlStore {
    // ===== Keyed Map =====

    /// Gets the row for a key
    fn get(&self, site: &str, title: &str) -> StorageResult<Option<QueueEntry>>;

    /// Inserts or overwrites the row for `entry`'s key
    fn put(&mut self, entry: &QueueEntry) -> StorageResult<()>;

    /// Deletes the row for a key, returning true if one existed
    fn remove(&mut self, site: &str, title: &str) -> StorageResult<bool>;

    /// All rows at exactly `level`, ordered by `(site, title)`
    fn scan_level(&self, level: i64) -> StorageResult<Vec<QueueEntry>>;

    /// Distinct levels present in the store, ascending
    fn levels(&self) -> StorageResult<Vec<i64>>;

    /// Every row, ordered by `(site, title)`
    fn entries(&self) -> StorageResult<Vec<QueueEntry>>;

    // ===== Normalizations =====

    fn record_normalization(&mut self, record: &NormalizationRecord) -> StorageResult<()>;

    /// Every normalization record in insertion order
    fn normalizations(&self) -> StorageResult<Vec<NormalizationRecord>>;

    // ===== Queue Operations =====

    /// Reports the status of a key
    ///
    /// # Arguments
    ///
    /// * `level` - Candidate level of a new discovery of the key
    /// * `verify` - Verify flag reported when no row exists
    ///
    /// # Returns
    ///
    /// * `New` with the candidate values if no row exists
    /// * `Waiting` with the lower of the stored and candidate level
    /// * `Done` with the stored values unchanged
    fn lookup(&self, site: &str, title: &str, level: i64, verify: Verify) -> StorageResult<Lookup> {
        Ok(match self.get(site, title)? {
            None => Lookup {
                status: QueueStatus::New,
                level,
                verify,
                attempts: 0,
            },
            Some(entry) => {
                let status = entry.status();
                let level = match status {
                    QueueStatus::Waiting => entry.level.min(level),
                    _ => entry.level,
                };
                Lookup {
                    status,
                    level,
                    verify: entry.verify,
                    attempts: entry.attempts,
                }
            }
        })
    }

    /// Stores an entry, overwriting any row with the same key
    fn enqueue(&mut self, entry: &QueueEntry) -> StorageResult<()> {
        self.put(entry)
    }

    /// Moves a row to the canonical title the wiki resolved it to
    ///
    /// Records the normalization, deletes the row under `stale_title` and
    /// stores `entry` under its own (canonical) title.
    fn replace_title(&mut self, stale_title: &str, entry: &QueueEntry) -> StorageResult<()> {
        self.record_normalization(&NormalizationRecord {
            old_title: stale_title.to_string(),
            new_title: entry.title.clone(),
            site: entry.site.clone(),
        })?;
        if stale_title != entry.title {
            self.remove(&entry.site, stale_title)?;
        }
        self.put(entry)
    }

    /// Confirmed rows at `level` still waiting to be fetched
    fn pending(&self, level: i64) -> StorageResult<Vec<QueueEntry>> {
        Ok(self
            .scan_level(level)?
            .into_iter()
            .filter(QueueEntry::is_pending)
            .collect())
    }

    /// Levels holding at least one pending row, ascending
    fn pending_levels(&self) -> StorageResult<Vec<i64>> {
        let mut levels = Vec::new();
        for level in self.levels()? {
            if !self.pending(level)?.is_empty() {
                levels.push(level);
            }
        }
        Ok(levels)
    }

    /// Promotes the waiting discoveries at `level` to confirmed entries
    ///
    /// Returns the number of promoted rows.
    fn confirm_level(&mut self, level: i64) -> StorageResult<usize> {
        let mut promoted = 0;
        for mut entry in self.scan_level(level)? {
            if entry.path.is_none() && entry.verify == Verify::Discovered {
                entry.verify = Verify::Confirmed;
                self.put(&entry)?;
                promoted += 1;
            }
        }
        Ok(promoted)
    }

    /// Normalizations whose canonical title is stored at `level`
    fn normalizations_at_level(&self, level: i64) -> StorageResult<Vec<NormalizationRecord>> {
        let mut found = Vec::new();
        for record in self.normalizations()? {
            if let Some(entry) = self.get(&record.site, &record.new_title)? {
                if entry.level == level {
                    found.push(record);
                }
            }
        }
        Ok(found)
    }
}
