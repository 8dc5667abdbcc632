//! Image mirroring
//!
//! Only the latest file revision is kept: its `imageinfo` entry goes to
//! `info.txt`, the description page to `info.html` and the asset itself to
//! `data.<ext>`.

use crate::api::PropQuery;
use crate::fetcher::layout::{DESCRIPTION_FILE, INFO_FILE};
use crate::fetcher::Fetcher;
use crate::{MirrorError, Result};
use serde_json::Value;
use std::path::PathBuf;

// `imageinfo` lists the upload history newest first
const IMAGE_INFO: PropQuery<'static> = PropQuery {
    prop: "imageinfo",
    prefix: "ii",
    fields: Some("user|userid|url|comment"),
    limit: Some(1),
};

/// Result of [`Fetcher::fetch_image`]
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub dir: PathBuf,

    /// `imageinfo` entry of the latest revision
    pub info: Value,
}

impl FetchedImage {
    /// Name of the user who uploaded the mirrored revision
    pub fn uploader(&self) -> Option<&str> {
        self.info.get("user").and_then(Value::as_str)
    }
}

impl Fetcher {
    /// Mirrors an image: metadata, description page and the asset itself
    pub async fn fetch_image(&self, site: &str, title: &str) -> Result<FetchedImage> {
        let session = self.client.session(site)?;
        let result = session
            .query_prop(title, None, &IMAGE_INFO, |item| Ok(item.clone()))
            .await?;

        let Some(latest) = result.items.into_iter().next() else {
            if result.page.get("missing").is_some() {
                return Err(MirrorError::PageMissing {
                    site: site.to_string(),
                    title: title.to_string(),
                });
            }
            return Err(MirrorError::Protocol(format!(
                "No file revision for [{}] {}",
                site, title
            )));
        };

        let dir = self.layout.create_dir(site, title)?;
        std::fs::write(dir.join(INFO_FILE), serde_json::to_string_pretty(&latest)?)?;

        if let Some(url) = latest.get("descriptionurl").and_then(Value::as_str) {
            let page = self.client.download(url).await?;
            std::fs::write(dir.join(DESCRIPTION_FILE), page)?;
        }
        if let Some(url) = latest.get("url").and_then(Value::as_str) {
            let data = self.client.download(url).await?;
            std::fs::write(dir.join(format!("data.{}", extension(url))), data)?;
        }

        tracing::debug!("Mirrored image [{}] {} into {}", site, title, dir.display());
        Ok(FetchedImage { dir, info: latest })
    }
}

/// File extension of an asset URL, `bin` if it has no usable one
fn extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let name = path.rsplit('/').next().unwrap_or_default();

    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => "bin".to_string(),
    }
}
