//! State module for tracking queue entries
//!
//! # Components
//!
//! - `EntryPath`: where a fetched entry lives, or the terminal outcome that replaced it
//! - `Verify`: how much an entry is trusted as a genuine crawl target
//! - `QueueStatus`: the lookup view of an entry (new, waiting, done)

mod entry_state;

// Re-export main types
pub use entry_state::{EntryPath, QueueStatus, Verify};
