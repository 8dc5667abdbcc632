//! wiki-mirror main entry point
//!
//! This is the command-line interface for the wiki-mirror crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wiki_mirror::config::{load_config_with_hash, Config};
use wiki_mirror::crawler::{load_seeds, Driver};
use wiki_mirror::output::{dump_users, load_statistics, print_statistics, write_repair_script};
use wiki_mirror::storage::{CrawlStore, SqliteStore};
use wiki_mirror::LinkClassifier;

/// wiki-mirror: a polite MediaWiki mirroring crawler
///
/// Mirrors wiki articles with their images and templates level by level,
/// following links found in already mirrored articles. Actions run in the
/// order they are listed below; without any action every pending level up
/// to `crawl.max-level` is crawled.
#[derive(Parser, Debug)]
#[command(name = "wiki-mirror")]
#[command(version = "1.0.0")]
#[command(about = "A polite MediaWiki mirroring crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Create a fresh store, moving an existing database aside
    #[arg(long)]
    create_store: bool,

    /// Load the ignore, auto and manual entry point lists
    #[arg(long)]
    load_seeds: bool,

    /// Confirm the discovered entries at this level (repeatable)
    #[arg(long = "confirm-level", value_name = "N", allow_negative_numbers = true)]
    confirm_levels: Vec<i64>,

    /// Crawl the pending entries at this level (repeatable)
    #[arg(long = "level", value_name = "N", allow_negative_numbers = true)]
    levels: Vec<i64>,

    /// Crawl every pending level up to crawl.max-level
    #[arg(long)]
    all_levels: bool,

    /// Write the link-repair script for normalized entry points
    #[arg(long)]
    repair_script: bool,

    /// Dump the contributor list of a site
    #[arg(long, value_name = "SITE")]
    dump_users: Option<String>,

    /// Resume the contributor dump from this user name
    #[arg(long, value_name = "NAME", requires = "dump_users")]
    users_from: Option<String>,

    /// Show statistics from the store
    #[arg(long)]
    stats: bool,
}

impl Cli {
    fn has_action(&self) -> bool {
        self.create_store
            || self.load_seeds
            || !self.confirm_levels.is_empty()
            || !self.levels.is_empty()
            || self.all_levels
            || self.repair_script
            || self.dump_users.is_some()
            || self.stats
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let db_path = Path::new(&config.output.database_path);
    let store = if cli.create_store {
        tracing::info!("Creating fresh store at {}", db_path.display());
        SqliteStore::create(db_path)
    } else {
        SqliteStore::open(db_path)
    }
    .with_context(|| format!("Failed to open store {}", db_path.display()))?;

    let mut driver = Driver::from_config(store, &config)?;

    if cli.load_seeds {
        let classifier = LinkClassifier::from_config(&config.crawl);
        load_seeds(driver.store_mut(), &classifier, &config.seeds)?;
    }

    for level in &cli.confirm_levels {
        let promoted = driver.store_mut().confirm_level(*level)?;
        tracing::info!("Confirmed {} entries at level {}", promoted, level);
    }

    for level in &cli.levels {
        driver.run_level(*level).await?;
    }

    if cli.all_levels || !cli.has_action() {
        handle_all_levels(&mut driver, &config).await?;
    }

    if cli.repair_script {
        let path = Path::new(&config.output.repair_script);
        write_repair_script(driver.store(), &config.repair, path)?;
    }

    if let Some(site) = &cli.dump_users {
        dump_users(
            driver.fetcher().client(),
            site,
            Path::new(&config.output.content_dir),
            cli.users_from.as_deref(),
            Duration::from_millis(config.crawl.user_list_delay_ms),
        )
        .await
        .with_context(|| format!("Failed to dump users of {}", site))?;
    }

    if cli.stats {
        println!("Database: {}\n", config.output.database_path);
        print_statistics(&load_statistics(driver.store())?);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wiki_mirror=info,warn"),
            1 => EnvFilter::new("wiki_mirror=debug,info"),
            2 => EnvFilter::new("wiki_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --all-levels: crawls until nothing is pending up to max-level
async fn handle_all_levels(
    driver: &mut Driver<SqliteStore>,
    config: &Config,
) -> anyhow::Result<()> {
    tracing::info!("Crawling all pending levels up to {}", config.crawl.max_level);

    let reports = driver.run_all(config.crawl.max_level).await?;
    let fetched: usize = reports.iter().map(|r| r.fetched).sum();
    let missing: usize = reports.iter().map(|r| r.missing).sum();
    let errors: usize = reports.iter().map(|r| r.errors).sum();

    tracing::info!(
        "Crawl completed: {} levels, {} fetched, {} missing, {} errors",
        reports.len(),
        fetched,
        missing,
        errors
    );
    Ok(())
}
