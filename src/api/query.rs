//! Read queries against a single wiki
//!
//! Every multi-value page property (contributors, images, templates, links,
//! interwiki and language links, image info) goes through
//! [`SiteSession::query_prop`], which is itself a thin layer over the generic
//! continuation loop in [`SiteSession::paginate`].

use crate::api::client::SiteSession;
use crate::api::types::{ApiReply, RevisionPage, RevisionReply};
use crate::{MirrorError, Result};
use serde_json::Value;
use std::time::Duration;

/// A paginated page-property query
#[derive(Debug, Clone, Copy)]
pub struct PropQuery<'a> {
    /// Property name, e.g. `templates`
    pub prop: &'a str,

    /// The API's per-property parameter prefix, e.g. `tl`
    pub prefix: &'a str,

    /// Optional `<prefix>prop` value selecting sub-fields
    pub fields: Option<&'a str>,

    /// Fixed `<prefix>limit`; when set only the first reply is read
    pub limit: Option<u32>,
}

impl<'a> PropQuery<'a> {
    pub const fn new(prop: &'a str, prefix: &'a str) -> Self {
        Self {
            prop,
            prefix,
            fields: None,
            limit: None,
        }
    }

    pub fn with_fields(mut self, fields: &'a str) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Asks for at most `limit` items and does not follow continuation
    pub fn first(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Items gathered by a property query
#[derive(Debug, Clone)]
pub struct PropResult<T> {
    /// Extracted items of every page, in reply order
    pub items: Vec<T>,

    /// The page object of the final reply, for scalar members such as
    /// `anoncontributors`
    pub page: Value,
}

/// Extractor returning the string member `name` of each item
pub fn field(name: &'static str) -> impl FnMut(&Value) -> Result<String> {
    move |item: &Value| {
        item.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| MirrorError::Protocol(format!("Item without '{}': {}", name, item)))
    }
}

impl<'a> SiteSession<'a> {
    /// Fetches the latest revision of `title`, following redirects
    ///
    /// Fails with `Protocol` unless the reply holds exactly one page.
    pub async fn revision(&self, title: &str) -> Result<RevisionReply> {
        let params = params(&[
            ("action", "query"),
            ("format", "json"),
            ("continue", ""),
            ("titles", title),
            ("prop", "revisions"),
            ("rvprop", "content|contentmodel"),
            ("rvlimit", "1"),
            ("redirects", "1"),
        ]);
        let reply = self.get(&params).await?;
        let query = reply.query.ok_or_else(|| {
            MirrorError::Protocol(format!("Reply without query for revisions of {}", title))
        })?;

        if query.pages.len() != 1 {
            return Err(MirrorError::Protocol(format!(
                "Expected one page in revisions reply for {}, got {}",
                title,
                query.pages.len()
            )));
        }
        let (page_id, page) = query
            .pages
            .into_iter()
            .next()
            .ok_or_else(|| MirrorError::Protocol(format!("Empty reply for {}", title)))?;
        let page: RevisionPage = serde_json::from_value(page)?;

        Ok(RevisionReply {
            page_id,
            page,
            normalized: query.normalized,
            redirects: query.redirects,
        })
    }

    /// Collects every item of a page property across all continuation pages
    ///
    /// A query with a fixed `limit` reads the first reply only.
    ///
    /// If `page_id` is `None` the reply must contain exactly one page, whose id
    /// is then used for the following pages. Every reply must echo `title`
    /// unchanged.
    pub async fn query_prop<T, F>(
        &self,
        title: &str,
        page_id: Option<&str>,
        query: &PropQuery<'_>,
        mut extract: F,
    ) -> Result<PropResult<T>>
    where
        F: FnMut(&Value) -> Result<T>,
    {
        let limit = query
            .limit
            .unwrap_or_else(|| self.client.page_limit())
            .to_string();
        let limit_key = format!("{}limit", query.prefix);
        let mut base = params(&[
            ("action", "query"),
            ("format", "json"),
            ("continue", ""),
            ("titles", title),
            ("prop", query.prop),
            (limit_key.as_str(), limit.as_str()),
        ]);
        if let Some(fields) = query.fields {
            base.push((format!("{}prop", query.prefix), fields.to_string()));
        }

        let mut page_id = page_id.map(str::to_string);
        let mut items = Vec::new();
        let mut last_page = Value::Null;

        let mut collect = |reply: ApiReply| -> Result<()> {
            let mut pages = reply.query.map(|q| q.pages).unwrap_or_default();

            let id = match &page_id {
                Some(id) => id.clone(),
                None => {
                    if pages.len() != 1 {
                        return Err(MirrorError::Protocol(format!(
                            "Multiple pages in {} reply for {}",
                            query.prop, title
                        )));
                    }
                    pages.keys().next().cloned().unwrap_or_default()
                }
            };

            let page = pages.remove(&id).ok_or_else(|| {
                MirrorError::Protocol(format!(
                    "Page {} absent from {} reply for {}",
                    id, query.prop, title
                ))
            })?;

            if page.get("title").and_then(Value::as_str) != Some(title) {
                return Err(MirrorError::Protocol(format!(
                    "Invalid title in {} reply for {}",
                    query.prop, title
                )));
            }

            if let Some(list) = page.get(query.prop).and_then(Value::as_array) {
                for item in list {
                    items.push(extract(item)?);
                }
            }

            page_id = Some(id);
            last_page = page;
            Ok(())
        };

        if query.limit.is_some() {
            collect(self.get(&base).await?)?;
        } else {
            self.paginate(&base, Duration::ZERO, &mut collect).await?;
        }

        Ok(PropResult {
            items,
            page: last_page,
        })
    }

    /// Property query returning the `title` member of each item
    pub async fn query_titles(
        &self,
        title: &str,
        page_id: Option<&str>,
        query: &PropQuery<'_>,
    ) -> Result<Vec<String>> {
        Ok(self
            .query_prop(title, page_id, query, field("title"))
            .await?
            .items)
    }

    /// Walks `list=allusers` for users with edits, handing each page to `on_page`
    pub async fn all_users<F>(&self, from: Option<&str>, pause: Duration, mut on_page: F) -> Result<()>
    where
        F: FnMut(Vec<Value>) -> Result<()>,
    {
        let mut base = params(&[
            ("action", "query"),
            ("format", "json"),
            ("continue", ""),
            ("list", "allusers"),
            ("auprop", "editcount"),
            ("auwitheditsonly", "1"),
            ("aulimit", "500"),
        ]);
        if let Some(from) = from {
            base.push(("aufrom".to_string(), from.to_string()));
        }

        self.paginate(&base, pause, |reply| {
            on_page(reply.query.map(|q| q.allusers).unwrap_or_default())
        })
        .await
    }
}

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
