//! Storage module for the crawl queue
//!
//! This module handles all persistence for the crawler, including:
//! - The `(site, title)` keyed queue with levels and completion state
//! - Normalization records for titles the wiki canonicalized
//! - SQLite and in-memory backends behind the [`CrawlStore`] trait

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CrawlStore, StorageError, StorageResult};

use crate::state::{EntryPath, QueueStatus, Verify};
use crate::MirrorError;

use std::path::Path;

/// Opens the SQLite store, creating the database file if needed
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully opened store
/// * `Err(MirrorError)` - Failed to open or initialize the database
pub fn open_store(path: &Path) -> Result<SqliteStore, MirrorError> {
    SqliteStore::open(path)
}

/// One row of the crawl queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub site: String,
    pub title: String,

    /// `None` while the entry is waiting to be fetched
    pub path: Option<EntryPath>,
    pub level: i64,
    pub verify: Verify,
    pub attempts: i64,
}

impl QueueEntry {
    /// A waiting entry
    pub fn waiting(site: &str, title: &str, level: i64, verify: Verify, attempts: i64) -> Self {
        Self {
            site: site.to_string(),
            title: title.to_string(),
            path: None,
            level,
            verify,
            attempts,
        }
    }

    /// Returns a copy with the given path
    pub fn with_path(mut self, path: EntryPath) -> Self {
        self.path = Some(path);
        self
    }

    pub fn status(&self) -> QueueStatus {
        match self.path {
            Some(_) => QueueStatus::Done,
            None => QueueStatus::Waiting,
        }
    }

    /// Returns true if the entry is fetched by `pending`
    pub fn is_pending(&self) -> bool {
        self.path.is_none() && self.verify == Verify::Confirmed
    }
}

/// A title the wiki resolved to a different canonical title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationRecord {
    pub old_title: String,
    pub new_title: String,
    pub site: String,
}

/// What the store knows about a key, as reported by [`CrawlStore::lookup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub status: QueueStatus,

    /// For waiting entries, the lower of the stored and the candidate level
    pub level: i64,
    pub verify: Verify,
    pub attempts: i64,
}
