//! Output module for operator-facing artifacts
//!
//! This module handles:
//! - The link-repair script for normalized entry points
//! - Contributor list dumps
//! - Queue statistics

mod repair;
pub mod stats;
mod users;

pub use repair::write_repair_script;
pub use stats::{load_statistics, print_statistics, CrawlStatistics, LevelCounts};
pub use users::{dump_users, user_list_path};
