//! In-memory crawl store
//!
//! Keeps the queue in a `BTreeMap` so scans come out in `(site, title)` order
//! like the SQLite backend's. Nothing survives the process.

use crate::storage::traits::{CrawlStore, StorageResult};
use crate::storage::{NormalizationRecord, QueueEntry};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: BTreeMap<(String, String), QueueEntry>,
    normalizations: Vec<NormalizationRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CrawlStore for MemoryStore {
    fn get(&self, site: &str, title: &str) -> StorageResult<Option<QueueEntry>> {
        Ok(self
            .rows
            .get(&(site.to_string(), title.to_string()))
            .cloned())
    }

    fn put(&mut self, entry: &QueueEntry) -> StorageResult<()> {
        self.rows
            .insert((entry.site.clone(), entry.title.clone()), entry.clone());
        Ok(())
    }

    fn remove(&mut self, site: &str, title: &str) -> StorageResult<bool> {
        Ok(self
            .rows
            .remove(&(site.to_string(), title.to_string()))
            .is_some())
    }

    fn scan_level(&self, level: i64) -> StorageResult<Vec<QueueEntry>> {
        Ok(self
            .rows
            .values()
            .filter(|entry| entry.level == level)
            .cloned()
            .collect())
    }

    fn levels(&self) -> StorageResult<Vec<i64>> {
        let levels: BTreeSet<i64> = self.rows.values().map(|entry| entry.level).collect();
        Ok(levels.into_iter().collect())
    }

    fn entries(&self) -> StorageResult<Vec<QueueEntry>> {
        Ok(self.rows.values().cloned().collect())
    }

    fn record_normalization(&mut self, record: &NormalizationRecord) -> StorageResult<()> {
        self.normalizations.push(record.clone());
        Ok(())
    }

    fn normalizations(&self) -> StorageResult<Vec<NormalizationRecord>> {
        Ok(self.normalizations.clone())
    }
}
