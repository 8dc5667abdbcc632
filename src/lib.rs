//! wiki-mirror: a polite MediaWiki mirroring crawler
//!
//! This crate mirrors wiki articles together with their images and templates
//! through the MediaWiki `api.php` interface. Crawl state lives in a durable
//! queue keyed by `(site, title)`, and links found in fetched articles are
//! classified into new queue entries with derived priority levels.

pub mod api;
pub mod config;
pub mod crawler;
pub mod fetcher;
pub mod link;
pub mod output;
pub mod state;
pub mod storage;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for wiki-mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The wiki answered with a non-success HTTP status
    #[error("HTTP {status} for {url}")]
    Remote { url: String, status: u16 },

    /// The reply does not have the shape a single-title query must have
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The wiki reports that the page does not exist
    #[error("Page missing: [{site}] {title}")]
    PageMissing { site: String, title: String },

    /// The revision is not wikitext or a recognized module dialect
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Repair script already exists: {}", .0.display())]
    RepairScriptExists(PathBuf),
}

impl MirrorError {
    /// Returns true for the expected "page does not exist" outcome
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::PageMissing { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for wiki-mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use link::{LinkClassifier, LinkTarget};
pub use state::{EntryPath, QueueStatus, Verify};
