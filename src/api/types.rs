//! Reply shapes of the MediaWiki query API
//!
//! Replies use the legacy JSON format: `query.pages` is a map keyed by page
//! id, revision text sits under `*`, and the next page of a multi-value
//! property is announced by a top-level `continue` object.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One decoded `action=query` reply
#[derive(Debug, Clone, Deserialize)]
pub struct ApiReply {
    #[serde(default)]
    pub query: Option<QueryBody>,

    /// Parameters to send back to fetch the next page
    #[serde(rename = "continue", default)]
    pub continuation: Option<Map<String, Value>>,

    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// The `query` member of a reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryBody {
    #[serde(default)]
    pub pages: BTreeMap<String, Value>,

    #[serde(default)]
    pub normalized: Vec<TitleMapping>,

    #[serde(default)]
    pub redirects: Vec<TitleMapping>,

    #[serde(default)]
    pub allusers: Vec<Value>,
}

/// A `from` → `to` title rewrite reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TitleMapping {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

/// A page object from a `prop=revisions` reply
#[derive(Debug, Clone, Deserialize)]
pub struct RevisionPage {
    pub title: String,

    #[serde(default)]
    pub missing: Option<Value>,

    #[serde(default)]
    pub invalid: Option<Value>,

    #[serde(default)]
    pub revisions: Vec<Revision>,
}

impl RevisionPage {
    pub fn is_missing(&self) -> bool {
        self.missing.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Revision {
    #[serde(default)]
    pub contentformat: Option<String>,

    #[serde(default)]
    pub contentmodel: Option<String>,

    #[serde(rename = "*", default)]
    pub content: String,
}

/// Result of a latest-revision query for a single title
#[derive(Debug, Clone)]
pub struct RevisionReply {
    /// Key of the page in `query.pages`
    pub page_id: String,
    pub page: RevisionPage,
    pub normalized: Vec<TitleMapping>,
    pub redirects: Vec<TitleMapping>,
}
