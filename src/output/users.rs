//! Contributor list dump
//!
//! Walks `list=allusers` for one wiki and appends every page of users with
//! edits to `<site>_userList.txt`, one pretty-printed JSON array per page.

use crate::api::ApiClient;
use crate::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Path of the user list for `site` under `dir`
pub fn user_list_path(dir: &Path, site: &str) -> PathBuf {
    dir.join(format!("{}_userList.txt", site))
}

/// Appends all users with edits on `site` to its user list file
///
/// # Arguments
///
/// * `client` - The API client
/// * `site` - Wiki host to list
/// * `dir` - Directory receiving the file
/// * `from` - Optional user name to resume from
/// * `pause` - Sleep between consecutive pages
///
/// # Returns
///
/// The number of users written.
pub async fn dump_users(
    client: &ApiClient,
    site: &str,
    dir: &Path,
    from: Option<&str>,
    pause: Duration,
) -> Result<usize> {
    let path = user_list_path(dir, site);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    let session = client.session(site)?;

    let mut total = 0;
    session
        .all_users(from, pause, |users| {
            total += users.len();
            writeln!(file, "{}", serde_json::to_string_pretty(&users)?)?;
            tracing::debug!("{} users written for {}", total, site);
            Ok(())
        })
        .await?;

    tracing::info!("Wrote {} users of {} to {}", total, site, path.display());
    Ok(total)
}
