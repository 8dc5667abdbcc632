//! Link classification for wiki-mirror
//!
//! Raw link tokens as they appear in article metadata (`w:en:Some Page#Section`,
//! `Foo/Bar`, `b:Handbook`) are resolved into the wiki host and title they point
//! at, plus the queue level the target should be crawled at.
//!
//! Subpages of the article a link was found in are crawled just after the
//! article itself (`base_level + subpage_step`), every other link is pushed
//! further out (`base_level + discovered_step`).

mod prefixes;

pub use prefixes::{is_language, project};

use crate::config::CrawlConfig;

/// A classified link target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    /// Wiki host, e.g. `en.wikipedia.org`
    pub site: String,

    /// Title within that wiki
    pub title: String,

    /// Queue level derived from the base article's level
    pub level: i64,
}

/// Where a link was found
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkContext<'a> {
    /// Title of the article containing the link
    pub base_title: Option<&'a str>,

    /// Queue level of that article
    pub base_level: i64,

    /// Site of that article; seeds the language and project of the link
    pub site: Option<&'a str>,
}

impl<'a> LinkContext<'a> {
    /// Context of a link found in an already fetched article
    pub fn article(site: &'a str, title: &'a str, level: i64) -> Self {
        Self {
            base_title: Some(title),
            base_level: level,
            site: Some(site),
        }
    }
}

/// Resolves raw link tokens into `(site, title, level)` triples
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    default_lang: String,
    default_project: String,
    subpage_step: i64,
    discovered_step: i64,
}

impl Default for LinkClassifier {
    fn default() -> Self {
        Self::new("pl", "wikipedia", 1, 10)
    }
}

impl LinkClassifier {
    pub fn new(lang: &str, project: &str, subpage_step: i64, discovered_step: i64) -> Self {
        Self {
            default_lang: lang.to_string(),
            default_project: project.to_string(),
            subpage_step,
            discovered_step,
        }
    }

    /// Builds a classifier from the crawl configuration
    pub fn from_config(config: &CrawlConfig) -> Self {
        let (lang, project) = split_site(&config.default_site);
        Self::new(lang, project, config.subpage_step, config.discovered_step)
    }

    /// Classifies a link token
    ///
    /// Returns `None` for links that must be ignored: in-page anchors of the
    /// base article and tokens with an empty title.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiki_mirror::link::{LinkClassifier, LinkContext};
    ///
    /// let classifier = LinkClassifier::default();
    /// let ctx = LinkContext { base_title: Some("Foo"), base_level: 5, site: None };
    ///
    /// assert_eq!(classifier.classify("Foo/Bar", &ctx).unwrap().level, 6);
    /// assert!(classifier.classify("Foo#History", &ctx).is_none());
    ///
    /// let target = classifier.classify("en:Qux", &ctx).unwrap();
    /// assert_eq!(target.site, "en.wikipedia.org");
    /// assert_eq!(target.level, 15);
    /// ```
    pub fn classify(&self, link: &str, ctx: &LinkContext<'_>) -> Option<LinkTarget> {
        let (body, fragment) = match link.split_once('#') {
            Some((body, fragment)) => (body, Some(fragment)),
            None => (link, None),
        };

        let (mut lang, mut project) = match ctx.site {
            Some(site) => split_site(site),
            None => (self.default_lang.as_str(), self.default_project.as_str()),
        };

        let segments: Vec<&str> = body.split(':').collect();
        let last = segments.len() - 1;
        let mut title_start = last;
        for (i, segment) in segments[..last].iter().enumerate() {
            if is_language(segment) {
                lang = *segment;
            } else if let Some(name) = prefixes::project(segment) {
                project = name;
            } else {
                title_start = i;
                break;
            }
        }

        let title = segments[title_start..].join(":");
        if title.is_empty() {
            return None;
        }

        let mut level = ctx.base_level + self.discovered_step;
        if let Some(rest) = ctx.base_title.and_then(|base| title.strip_prefix(base)) {
            if rest.is_empty() && fragment.is_some() {
                return None;
            }
            if rest.starts_with('/') || rest.starts_with(':') {
                level = ctx.base_level + self.subpage_step;
            }
        }

        // Commons has no language editions
        let site = if project.contains('.') {
            format!("{}.org", project)
        } else {
            format!("{}.{}.org", lang, project)
        };

        Some(LinkTarget { site, title, level })
    }
}

/// Splits a host into its language and project labels
///
/// `commons.wikimedia.org` yields `("commons", "wikimedia")`, which rebuilds
/// into the same host.
fn split_site(site: &str) -> (&str, &str) {
    let mut labels = site.splitn(3, '.');
    let lang = labels.next().unwrap_or_default();
    let project = labels.next().unwrap_or_default();
    (lang, project)
}
