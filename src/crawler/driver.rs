//! Crawl driver - the per-level fetch and expand loop
//!
//! This module coordinates one crawl pass:
//! - Snapshotting the pending entries of a level
//! - Fetching each article with its images and templates
//! - Classifying outbound links into new or sharpened queue entries
//! - Recording results, canonical titles and terminal failures
//! - Throttling between items

use crate::config::Config;
use crate::crawler::throttle::Throttle;
use crate::fetcher::{ArticleInfo, FetchedArticle, Fetcher};
use crate::link::{LinkClassifier, LinkContext};
use crate::state::{EntryPath, QueueStatus, Verify};
use crate::storage::{CrawlStore, QueueEntry};
use crate::{MirrorError, Result};
use std::time::Instant;

/// Outcome counts of one level pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelReport {
    pub level: i64,
    pub fetched: usize,
    pub missing: usize,
    pub errors: usize,
}

impl LevelReport {
    pub fn total(&self) -> usize {
        self.fetched + self.missing + self.errors
    }
}

/// Main crawl driver structure
pub struct Driver<S: CrawlStore> {
    store: S,
    fetcher: Fetcher,
    classifier: LinkClassifier,
    throttle: Throttle,
}

impl<S: CrawlStore> Driver<S> {
    pub fn new(store: S, fetcher: Fetcher, classifier: LinkClassifier, throttle: Throttle) -> Self {
        Self {
            store,
            fetcher,
            classifier,
            throttle,
        }
    }

    /// Creates a driver over `store` with the fetcher, classifier and
    /// throttle described by `config`
    ///
    /// # Arguments
    ///
    /// * `store` - The crawl store to drive
    /// * `config` - The mirror configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Driver)` - Successfully created driver
    /// * `Err(MirrorError)` - The HTTP client could not be built
    pub fn from_config(store: S, config: &Config) -> Result<Self> {
        Ok(Self::new(
            store,
            Fetcher::from_config(config)?,
            LinkClassifier::from_config(&config.crawl),
            Throttle::from_config(&config.crawl),
        ))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Processes every entry pending at `level` when the pass starts
    ///
    /// Per-item failures are recorded as terminal sentinels and never abort
    /// the pass; only store failures while recording them do.
    pub async fn run_level(&mut self, level: i64) -> Result<LevelReport> {
        let pending = self.store.pending(level)?;
        tracing::info!("Level {}: {} pending entries", level, pending.len());

        let mut report = LevelReport {
            level,
            ..LevelReport::default()
        };
        let start_time = Instant::now();

        for queued in pending {
            // An earlier item may have fetched or renamed this one
            let current = match self.store.get(&queued.site, &queued.title)? {
                Some(entry) if entry.status() == QueueStatus::Waiting => entry,
                _ => {
                    tracing::debug!("[{}] {} no longer waiting", queued.site, queued.title);
                    continue;
                }
            };

            let started = Instant::now();
            match self.process(&current).await {
                Ok(article) => {
                    report.fetched += 1;
                    tracing::info!(
                        "[{}] {} -> {}{}",
                        current.site,
                        current.title,
                        article.dir.display(),
                        if article.status.done { " (cached)" } else { "" }
                    );
                }
                Err(e) if e.is_missing() => {
                    report.missing += 1;
                    tracing::info!("[{}] {} is missing", current.site, current.title);
                    self.store
                        .enqueue(&current.clone().with_path(EntryPath::Missing))?;
                }
                Err(e) => {
                    report.errors += 1;
                    tracing::error!("Error processing [{}] {}: {}", current.site, current.title, e);
                    self.store.enqueue(&current.clone().with_path(EntryPath::Error))?;
                }
            }

            self.throttle.pause(started).await;
        }

        tracing::info!(
            "Level {} done in {:.1}s: {} fetched, {} missing, {} errors",
            level,
            start_time.elapsed().as_secs_f64(),
            report.fetched,
            report.missing,
            report.errors
        );
        Ok(report)
    }

    /// Runs level passes in ascending order until nothing is pending at or
    /// below `max_level`
    pub async fn run_all(&mut self, max_level: i64) -> Result<Vec<LevelReport>> {
        let mut reports = Vec::new();

        loop {
            let next = self
                .store
                .pending_levels()?
                .into_iter()
                .find(|level| *level <= max_level);
            let Some(level) = next else {
                break;
            };
            reports.push(self.run_level(level).await?);
        }

        tracing::info!("No pending entries up to level {}", max_level);
        Ok(reports)
    }

    /// Fetches one queued article and records everything it leads to
    async fn process(&mut self, entry: &QueueEntry) -> Result<FetchedArticle> {
        let article = self
            .fetcher
            .fetch_article(&entry.site, &entry.title, true, false)
            .await?;
        let site = article.site();

        if !article.status.done {
            for image in article.info.images() {
                self.mirror_image(site, image, entry.level).await?;
            }
            for template in article.info.templates() {
                if let Err(e) = self.mirror_template(site, template, entry.level).await {
                    tracing::warn!("Skipping template [{}] {}: {}", site, template, e);
                }
            }
        }

        self.enqueue_links(&article.info, entry.level)?;

        let path = EntryPath::Stored(article.dir.clone());
        let row = QueueEntry {
            site: site.to_string(),
            title: article.title().to_string(),
            path: Some(path.clone()),
            level: entry.level,
            verify: entry.verify,
            attempts: entry.attempts,
        };
        if article.status.renamed() {
            tracing::info!(
                "[{}] {} is now {} ({})",
                site,
                entry.title,
                row.title,
                if article.status.redirect { "redirect" } else { "normalized" }
            );
            self.store.replace_title(&entry.title, &row)?;
        } else {
            self.store.enqueue(&row)?;
        }

        // The requested title stays a normalization record, not an alias row
        for alias in article.info.redirects() {
            if alias == article.title() || *alias == entry.title {
                continue;
            }
            self.store.enqueue(&QueueEntry {
                site: site.to_string(),
                title: alias.clone(),
                path: Some(path.clone()),
                level: entry.level,
                verify: Verify::Redirect,
                attempts: entry.attempts,
            })?;
        }

        Ok(article)
    }

    /// Mirrors an image the article uses, unless it is already done
    ///
    /// A missing image is recorded as such; any other failure is returned.
    async fn mirror_image(&mut self, site: &str, title: &str, level: i64) -> Result<()> {
        let found = self.store.lookup(site, title, level, Verify::Discovered)?;
        if found.status.is_done() {
            return Ok(());
        }

        let path = match self.fetcher.fetch_image(site, title).await {
            Ok(image) => {
                tracing::debug!(
                    "Image [{}] {} uploaded by {}",
                    site,
                    title,
                    image.uploader().unwrap_or("<unknown>")
                );
                EntryPath::Stored(image.dir)
            }
            Err(MirrorError::PageMissing { .. }) => {
                tracing::info!("Image [{}] {} is missing", site, title);
                EntryPath::Missing
            }
            Err(e) => return Err(e),
        };

        self.store.enqueue(
            &QueueEntry::waiting(site, title, found.level, found.verify, found.attempts + 1)
                .with_path(path),
        )?;
        Ok(())
    }

    /// Mirrors a template the article transcludes, unless it is already done
    async fn mirror_template(&mut self, site: &str, title: &str, level: i64) -> Result<()> {
        let found = self.store.lookup(site, title, level, Verify::Discovered)?;
        if found.status.is_done() {
            return Ok(());
        }

        let template = self.fetcher.fetch_article(site, title, false, false).await?;
        let row = QueueEntry {
            site: site.to_string(),
            title: template.title().to_string(),
            path: Some(EntryPath::Stored(template.dir.clone())),
            level: found.level,
            verify: found.verify,
            attempts: found.attempts + 1,
        };
        if template.status.renamed() {
            self.store.replace_title(title, &row)?;
        } else {
            self.store.enqueue(&row)?;
        }
        Ok(())
    }

    /// Queues the outbound links of an article
    ///
    /// New targets are recorded as unconfirmed discoveries; waiting targets
    /// keep their verify flag and move to the lower of the two levels.
    fn enqueue_links(&mut self, info: &ArticleInfo, level: i64) -> Result<()> {
        let ctx = LinkContext::article(&info.site, &info.title, level);

        for link in info.links() {
            let Some(target) = self.classifier.classify(link, &ctx) else {
                continue;
            };

            let found =
                self.store
                    .lookup(&target.site, &target.title, target.level, Verify::Discovered)?;
            let attempts = match found.status {
                QueueStatus::New => 1,
                QueueStatus::Waiting => found.attempts + 1,
                QueueStatus::Done => continue,
            };
            self.store.enqueue(&QueueEntry::waiting(
                &target.site,
                &target.title,
                found.level,
                found.verify,
                attempts,
            ))?;
        }
        Ok(())
    }
}
