//! Configuration module for wiki-mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use wiki_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Store lives at: {}", config.output.database_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, CrawlConfig, OutputConfig, RepairConfig, RepairTarget, SeedConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
