//! Statistics generation from the crawl store
//!
//! This module provides functionality for extracting and displaying
//! queue statistics from the storage layer.

use crate::state::Verify;
use crate::storage::CrawlStore;
use crate::MirrorError;
use std::collections::BTreeMap;

/// Entry counts of one level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelCounts {
    /// Confirmed and waiting
    pub pending: u64,

    /// Unconfirmed discoveries, waiting
    pub discovered: u64,

    /// Fetched or terminal
    pub done: u64,
}

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Total number of queue rows
    pub total_entries: u64,

    /// Count of done rows by outcome label (`stored`, `missing`, ...)
    pub by_outcome: BTreeMap<&'static str, u64>,

    /// Counts per level, ascending
    pub by_level: BTreeMap<i64, LevelCounts>,

    /// Rows per site
    pub by_site: BTreeMap<String, u64>,

    /// Rows confirmed through a redirect
    pub redirects: u64,

    /// Recorded title normalizations
    pub normalizations: u64,
}

/// Loads statistics from the store
///
/// # Arguments
///
/// * `store` - The store to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(MirrorError)` - Failed to read the store
pub fn load_statistics(store: &dyn CrawlStore) -> Result<CrawlStatistics, MirrorError> {
    let mut stats = CrawlStatistics::default();

    for entry in store.entries()? {
        stats.total_entries += 1;
        *stats.by_site.entry(entry.site.clone()).or_default() += 1;
        if entry.verify == Verify::Redirect {
            stats.redirects += 1;
        }

        let level = stats.by_level.entry(entry.level).or_default();
        match &entry.path {
            Some(path) => {
                level.done += 1;
                *stats.by_outcome.entry(path.label()).or_default() += 1;
            }
            None if entry.is_pending() => level.pending += 1,
            None => level.discovered += 1,
        }
    }

    stats.normalizations = store.normalizations()?.len() as u64;
    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Mirror Statistics ===\n");

    println!("Overview:");
    println!("  Total entries: {}", stats.total_entries);
    println!("  Redirect aliases: {}", stats.redirects);
    println!("  Normalized titles: {}", stats.normalizations);
    println!();

    println!("Done by Outcome:");
    for (outcome, count) in &stats.by_outcome {
        let percentage = if stats.total_entries > 0 {
            (*count as f64 / stats.total_entries as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", outcome, count, percentage);
    }
    println!();

    println!("By Level (pending / discovered / done):");
    for (level, counts) in &stats.by_level {
        println!(
            "  {:>6}: {} / {} / {}",
            level, counts.pending, counts.discovered, counts.done
        );
    }
    println!();

    if !stats.by_site.is_empty() {
        println!("Sites ({}):", stats.by_site.len());
        for (site, count) in &stats.by_site {
            println!("  - {}: {}", site, count);
        }
    }
}
