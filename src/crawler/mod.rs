//! Crawler module for wiki mirroring
//!
//! This module contains the crawl control loop, including:
//! - Seeding the queue from the entry point lists
//! - Level-by-level fetching through the [`Driver`]
//! - Adaptive throttling between items

mod driver;
pub mod seeds;
mod throttle;

pub use driver::{Driver, LevelReport};
pub use seeds::{load_seeds, SeedReport};
pub use throttle::Throttle;

