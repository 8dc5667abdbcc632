//! Article fetching
//!
//! This module handles:
//! - Short-circuiting titles already mirrored on disk
//! - Latest-revision retrieval and content-type validation
//! - Resolving normalized and redirected titles
//! - Collecting contributors, redirects, images, templates and links
//! - Writing `data.txt` and the `info.txt` sidecar

use crate::api::{field, PropQuery, Revision, SiteSession, TitleMapping};
use crate::fetcher::layout::{DATA_FILE, INFO_FILE};
use crate::fetcher::Fetcher;
use crate::{MirrorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const CONTRIBUTORS: PropQuery<'static> = PropQuery::new("contributors", "pc");
const REDIRECTS: PropQuery<'static> = PropQuery::new("redirects", "rd");
const IMAGES: PropQuery<'static> = PropQuery::new("images", "im");
const TEMPLATES: PropQuery<'static> = PropQuery::new("templates", "tl");
const LINKS: PropQuery<'static> = PropQuery::new("links", "pl");
const INTERWIKI: PropQuery<'static> = PropQuery::new("iwlinks", "iw");
const LANGLINKS: PropQuery<'static> = PropQuery::new("langlinks", "ll");

const CONTENT_FORMATS: &[&str] = &["text/x-wiki", "text/plain"];
const CONTENT_MODELS: &[&str] = &["wikitext", "Scribunto"];

/// Metadata of one mirrored article, stored as `info.txt`
///
/// The list members are `None` when the article was fetched without links
/// (templates are mirrored that way).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleInfo {
    pub site: String,
    pub title: String,
    #[serde(rename = "pageID")]
    pub page_id: String,
    #[serde(default)]
    pub contributors: Option<Contributors>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub templates: Option<Vec<String>>,
    #[serde(default)]
    pub links: Option<Vec<String>>,
    #[serde(default)]
    pub redirects: Option<Vec<String>>,
    #[serde(rename = "fetchedAt", default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributors {
    pub users: Vec<Contributor>,
    #[serde(default)]
    pub anonymous: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    #[serde(default)]
    pub userid: u64,
    pub name: String,
}

impl ArticleInfo {
    /// Reads a sidecar back from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn links(&self) -> &[String] {
        self.links.as_deref().unwrap_or_default()
    }

    pub fn images(&self) -> &[String] {
        self.images.as_deref().unwrap_or_default()
    }

    pub fn templates(&self) -> &[String] {
        self.templates.as_deref().unwrap_or_default()
    }

    pub fn redirects(&self) -> &[String] {
        self.redirects.as_deref().unwrap_or_default()
    }
}

/// How a fetch was satisfied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStatus {
    /// Served from the local artifact without fetching content
    pub done: bool,

    /// The API normalized the requested title
    pub normalized: bool,

    /// The requested title is a redirect
    pub redirect: bool,
}

impl FetchStatus {
    /// Returns true if the resolved title differs from the requested one
    pub fn renamed(&self) -> bool {
        self.normalized || self.redirect
    }
}

/// Result of [`Fetcher::fetch_article`]
#[derive(Debug, Clone)]
pub struct FetchedArticle {
    /// Metadata under the canonical title
    pub info: ArticleInfo,
    pub dir: PathBuf,
    pub status: FetchStatus,
}

impl FetchedArticle {
    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn site(&self) -> &str {
        &self.info.site
    }
}

impl Fetcher {
    /// Fetches an article and mirrors it to the content directory
    ///
    /// Returns the stored metadata with `status.done` set, without network
    /// I/O, when the title was mirrored before and `force_refresh` is false.
    ///
    /// # Errors
    ///
    /// * `PageMissing` - the wiki has no such page
    /// * `Validation` - the revision is not wikitext or a Scribunto module
    /// * `Protocol` - the reply does not describe exactly the requested page
    /// * `Remote` / `Http` - transport failures
    pub async fn fetch_article(
        &self,
        site: &str,
        title: &str,
        want_links: bool,
        force_refresh: bool,
    ) -> Result<FetchedArticle> {
        if !force_refresh {
            if let Some(found) = self.mirrored(site, title, FetchStatus::default()) {
                return Ok(found);
            }
        }

        let session = self.client.session(site)?;
        let reply = session.revision(title).await?;
        let page = reply.page;

        if page.is_missing() {
            return Err(MirrorError::PageMissing {
                site: site.to_string(),
                title: title.to_string(),
            });
        }
        if page.invalid.is_some() {
            return Err(MirrorError::Protocol(format!(
                "Invalid title [{}] {}",
                site, title
            )));
        }

        let revision = page.revisions.into_iter().next().ok_or_else(|| {
            MirrorError::Protocol(format!("No revision in reply for [{}] {}", site, title))
        })?;
        validate_revision(&revision, title)?;

        let mut status = FetchStatus::default();
        let resolved = page.title;
        if resolved != title {
            status = resolve_title(title, &resolved, &reply.normalized, &reply.redirects)?;
            tracing::debug!("[{}] {} resolved to {}", site, title, resolved);
            if !force_refresh {
                if let Some(found) = self.mirrored(site, &resolved, status) {
                    return Ok(found);
                }
            }
        }

        let mut info = ArticleInfo {
            site: site.to_string(),
            title: resolved.clone(),
            page_id: reply.page_id.clone(),
            contributors: None,
            images: None,
            templates: None,
            links: None,
            redirects: None,
            fetched_at: Some(Utc::now()),
        };
        if want_links {
            self.collect_links(&session, &reply.page_id, &mut info)
                .await?;
        }

        let dir = self.layout.create_dir(site, &resolved)?;
        std::fs::write(dir.join(DATA_FILE), &revision.content)?;
        std::fs::write(dir.join(INFO_FILE), serde_json::to_string_pretty(&info)?)?;

        Ok(FetchedArticle { info, dir, status })
    }

    /// Loads an existing artifact, if there is a readable one
    fn mirrored(&self, site: &str, title: &str, mut status: FetchStatus) -> Option<FetchedArticle> {
        if !self.layout.has_artifact(site, title) {
            return None;
        }

        let dir = self.layout.dir_for(site, title);
        match ArticleInfo::load(&dir.join(INFO_FILE)) {
            Ok(info) => {
                status.done = true;
                Some(FetchedArticle { info, dir, status })
            }
            Err(e) => {
                tracing::warn!(
                    "Unreadable metadata for [{}] {} ({}), fetching again",
                    site,
                    title,
                    e
                );
                None
            }
        }
    }

    /// Fills contributors, redirects and every kind of outbound reference
    async fn collect_links(
        &self,
        session: &SiteSession<'_>,
        page_id: &str,
        info: &mut ArticleInfo,
    ) -> Result<()> {
        let title = info.title.as_str();
        let id = Some(page_id);

        let contributors = session
            .query_prop(title, id, &CONTRIBUTORS, |item| {
                Ok(serde_json::from_value::<Contributor>(item.clone())?)
            })
            .await?;
        let anonymous = contributors
            .page
            .get("anoncontributors")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let redirects = session.query_titles(title, id, &REDIRECTS).await?;
        let images = session.query_titles(title, id, &IMAGES).await?;
        let templates = session.query_titles(title, id, &TEMPLATES).await?;
        let mut links = session.query_titles(title, id, &LINKS).await?;

        let interwiki = session
            .query_prop(title, id, &INTERWIKI, prefixed("prefix"))
            .await?;
        links.extend(interwiki.items);

        let languages = session
            .query_prop(title, id, &LANGLINKS, |item| {
                let lang = field("lang")(item)?;
                let target = field("*")(item)?;
                Ok((lang, target))
            })
            .await?;
        links.extend(
            languages
                .items
                .into_iter()
                .filter(|(lang, _)| self.link_languages.iter().any(|l| l == lang))
                .map(|(lang, target)| format!("{}:{}", lang, target)),
        );

        info.contributors = Some(Contributors {
            users: contributors.items,
            anonymous,
        });
        info.redirects = Some(redirects);
        info.images = Some(images);
        info.templates = Some(templates);
        info.links = Some(links);
        Ok(())
    }
}

/// Extractor rewriting `{key: p, "*": t}` items as `p:t` link strings
fn prefixed(key: &'static str) -> impl FnMut(&Value) -> Result<String> {
    move |item: &Value| {
        let prefix = field(key)(item)?;
        let target = field("*")(item)?;
        Ok(format!("{}:{}", prefix, target))
    }
}

/// Rejects revisions that are not wikitext or a Scribunto module
fn validate_revision(revision: &Revision, title: &str) -> Result<()> {
    match revision.contentformat.as_deref() {
        Some(format) if CONTENT_FORMATS.contains(&format) => {}
        other => {
            return Err(MirrorError::Validation(format!(
                "Invalid content format '{}' for {}",
                other.unwrap_or("<none>"),
                title
            )))
        }
    }

    match revision.contentmodel.as_deref() {
        Some(model) if CONTENT_MODELS.contains(&model) => Ok(()),
        other => Err(MirrorError::Validation(format!(
            "Invalid content model '{}' for {}",
            other.unwrap_or("<none>"),
            title
        ))),
    }
}

/// Explains how `requested` became `resolved`
///
/// The normalization is applied first, then the redirect hops; the chain must
/// end exactly at the title the API returned.
fn resolve_title(
    requested: &str,
    resolved: &str,
    normalized: &[TitleMapping],
    redirects: &[TitleMapping],
) -> Result<FetchStatus> {
    let mut status = FetchStatus::default();
    let mut current = requested.to_string();

    if let Some(mapping) = normalized.iter().find(|m| m.from == current) {
        current = mapping.to.clone();
        status.normalized = true;
    }

    for _ in 0..redirects.len() {
        match redirects.iter().find(|m| m.from == current) {
            Some(mapping) if mapping.to != current => {
                current = mapping.to.clone();
                status.redirect = true;
            }
            _ => break,
        }
    }

    if current != resolved {
        return Err(MirrorError::Protocol(format!(
            "Invalid title in reply: requested {}, got {}",
            requested, resolved
        )));
    }
    Ok(status)
}
