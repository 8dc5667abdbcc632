//! Remote content client for the MediaWiki API
//!
//! This module contains:
//! - The shared HTTP client and per-site sessions
//! - The generic continuation-following query loop
//! - Revision, page-property and user-list queries
//! - Reply types

mod client;
mod query;
mod types;

pub use client::{user_agent_string, ApiClient, SiteSession};
pub use query::{field, PropQuery, PropResult};
pub use types::{ApiReply, QueryBody, Revision, RevisionPage, RevisionReply, TitleMapping};
