//! Link-repair script generation
//!
//! Entry points whose titles the wiki normalized are still linked under the
//! old title from elsewhere. The script lists one `fixWiki` call per such
//! title so an operator can review and run the corrections.

use crate::config::{RepairConfig, RepairTarget};
use crate::storage::{CrawlStore, NormalizationRecord};
use crate::{MirrorError, Result};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

/// Writes the repair script to `path`
///
/// # Errors
///
/// * `RepairScriptExists` - a file is already present at `path`; it is never
///   overwritten
///
/// # Returns
///
/// The number of lines written.
pub fn write_repair_script(
    store: &dyn CrawlStore,
    config: &RepairConfig,
    path: &Path,
) -> Result<usize> {
    if path.exists() {
        return Err(MirrorError::RepairScriptExists(path.to_path_buf()));
    }

    let lines = repair_lines(&store.normalizations_at_level(config.level)?, &config.targets);

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    for line in &lines {
        writeln!(file, "{}", line)?;
    }

    tracing::info!("Wrote {} repair lines to {}", lines.len(), path.display());
    Ok(lines.len())
}

/// One line per distinct record on a known site, in record order
fn repair_lines(records: &[NormalizationRecord], targets: &[RepairTarget]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut lines = Vec::new();

    for record in records {
        let Some(target) = targets.iter().find(|t| t.site == record.site) else {
            continue;
        };
        let line = format!(
            "fixWiki {} \"{}\" \"{}\"",
            target.lang,
            shell_escape(&format!("{}{}", target.prefix, record.old_title)),
            shell_escape(&format!("{}{}", target.prefix, record.new_title)),
        );
        if seen.insert(line.clone()) {
            lines.push(line);
        }
    }
    lines
}

/// Escapes the characters that stay special inside shell double quotes
fn shell_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
