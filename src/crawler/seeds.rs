//! Seed list loading
//!
//! Three plain-text files feed the queue, one link per line: an ignore list,
//! automatically derived entry points and manually curated entry points.

use crate::config::SeedConfig;
use crate::link::{LinkClassifier, LinkContext};
use crate::state::{EntryPath, QueueStatus, Verify};
use crate::storage::{CrawlStore, QueueEntry};
use crate::Result;
use std::path::Path;

/// Level of ignored entries; never scanned by the driver
pub const IGNORED_LEVEL: i64 = -1;

/// What loading the seed files changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub promoted: usize,
    pub unchanged: usize,
}

/// Loads all three seed files into the store
///
/// Missing files are skipped with a warning.
pub fn load_seeds(
    store: &mut dyn CrawlStore,
    classifier: &LinkClassifier,
    seeds: &SeedConfig,
) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for link in read_seed_file(Path::new(&seeds.ignore))? {
        let Some(target) = classifier.classify(&link, &LinkContext::default()) else {
            continue;
        };
        if store.get(&target.site, &target.title)?.is_some() {
            report.unchanged += 1;
            continue;
        }
        store.enqueue(
            &QueueEntry::waiting(&target.site, &target.title, IGNORED_LEVEL, Verify::Confirmed, 1)
                .with_path(EntryPath::Ignored),
        )?;
        report.inserted += 1;
    }

    for (file, level) in [
        (&seeds.manual, seeds.manual_level),
        (&seeds.auto, seeds.auto_level),
    ] {
        for link in read_seed_file(Path::new(file))? {
            seed_entry_point(store, classifier, &link, level, &mut report)?;
        }
    }

    tracing::info!(
        "Seeds loaded: {} inserted, {} promoted, {} unchanged",
        report.inserted,
        report.promoted,
        report.unchanged
    );
    Ok(report)
}

/// Queues one confirmed entry point at `level`
fn seed_entry_point(
    store: &mut dyn CrawlStore,
    classifier: &LinkClassifier,
    link: &str,
    level: i64,
    report: &mut SeedReport,
) -> Result<()> {
    let Some(target) = classifier.classify(link, &LinkContext::default()) else {
        tracing::debug!("Skipping seed without a title: {:?}", link);
        return Ok(());
    };

    let found = store.lookup(&target.site, &target.title, level, Verify::Confirmed)?;
    match found.status {
        QueueStatus::New => {
            store.enqueue(&QueueEntry::waiting(
                &target.site,
                &target.title,
                level,
                Verify::Confirmed,
                1,
            ))?;
            report.inserted += 1;
        }
        QueueStatus::Waiting if found.verify == Verify::Discovered => {
            store.enqueue(&QueueEntry::waiting(
                &target.site,
                &target.title,
                found.level,
                Verify::Confirmed,
                found.attempts,
            ))?;
            report.promoted += 1;
        }
        QueueStatus::Waiting => {
            store.enqueue(&QueueEntry::waiting(
                &target.site,
                &target.title,
                found.level,
                found.verify,
                found.attempts,
            ))?;
            report.unchanged += 1;
        }
        QueueStatus::Done => report.unchanged += 1,
    }
    Ok(())
}

/// Non-empty trimmed lines of a seed file
fn read_seed_file(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        tracing::warn!("Seed file {} not found, skipping", path.display());
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
