//! On-disk layout of mirrored content
//!
//! Every `(site, title)` maps to `<root>/<site>/<seg1>/<seg2>/...` where the
//! segments are the `/`-separated parts of the title, so subpages nest under
//! their parent article.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Metadata sidecar written for every article and image
pub const INFO_FILE: &str = "info.txt";

/// Raw article text
pub const DATA_FILE: &str = "data.txt";

/// Saved description page of an image
pub const DESCRIPTION_FILE: &str = "info.html";

/// Deterministic mapping from `(site, title)` to a content directory
#[derive(Debug, Clone)]
pub struct ContentLayout {
    root: PathBuf,
}

impl ContentLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for `(site, title)`; not created
    pub fn dir_for(&self, site: &str, title: &str) -> PathBuf {
        let mut dir = self.root.join(&*escape_segment(site));
        for segment in title.split('/') {
            if !segment.is_empty() {
                dir.push(&*escape_segment(segment));
            }
        }
        dir
    }

    /// Returns true if a metadata sidecar exists for `(site, title)`
    pub fn has_artifact(&self, site: &str, title: &str) -> bool {
        self.dir_for(site, title).join(INFO_FILE).is_file()
    }

    /// Creates the directory for `(site, title)` with all its parents
    pub fn create_dir(&self, site: &str, title: &str) -> std::io::Result<PathBuf> {
        let dir = self.dir_for(site, title);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Keeps a title segment inside its parent directory
fn escape_segment(segment: &str) -> Cow<'_, str> {
    match segment {
        "." => Cow::Borrowed("%2E"),
        ".." => Cow::Borrowed("%2E%2E"),
        s if s.contains('\\') || s.contains('\0') => {
            Cow::Owned(s.replace('\\', "%5C").replace('\0', "%00"))
        }
        s => Cow::Borrowed(s),
    }
}
