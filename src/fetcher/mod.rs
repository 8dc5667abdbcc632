//! Article and image fetching for wiki-mirror
//!
//! A [`Fetcher`] turns one `(site, title)` into files under the content
//! directory and returns the metadata the crawl driver needs to continue:
//! the canonical title, outbound links, images and templates.

mod article;
mod image;
pub mod layout;

pub use article::{ArticleInfo, Contributor, Contributors, FetchStatus, FetchedArticle};
pub use image::FetchedImage;
pub use layout::ContentLayout;

use crate::api::ApiClient;
use crate::config::Config;
use crate::Result;

/// Fetches wiki content and mirrors it to disk
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: ApiClient,
    layout: ContentLayout,

    /// Language links outside this set are dropped
    link_languages: Vec<String>,
}

impl Fetcher {
    pub fn new(client: ApiClient, layout: ContentLayout, link_languages: Vec<String>) -> Self {
        Self {
            client,
            layout,
            link_languages,
        }
    }

    /// Builds a fetcher with its own API client from the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ApiClient::new(&config.api, &config.user_agent)?;
        Ok(Self::new(
            client,
            ContentLayout::new(&config.output.content_dir),
            config.crawl.link_languages.clone(),
        ))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn layout(&self) -> &ContentLayout {
        &self.layout
    }
}
