//! Source-list ingestion and destination mirroring.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Read a copy-run input list: UTF-8 text, one path per line. Blank lines and
/// paths that resolve to existing directories are skipped and never reach the
/// task queue.
pub fn read_source_list(list_path: &Path) -> Result<Vec<PathBuf>> {
    let data = fs::read_to_string(list_path)
        .with_context(|| format!("read input list {}", list_path.display()))?;
    let mut sources = Vec::new();
    for entry in data.lines() {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let path = PathBuf::from(entry);
        if path.is_dir() {
            tracing::debug!(path = %path.display(), "skipping directory entry");
            continue;
        }
        sources.push(path);
    }
    Ok(sources)
}

/// Compute the mirrored destination for `source` under `dest_dir`.
///
/// Only normal components are kept: an absolute `/a/b/c` under `out` becomes
/// `out/a/b/c`, and `.`/`..` segments cannot move the result outside
/// `dest_dir`.
pub fn mirror_destination(source: &Path, dest_dir: &Path) -> PathBuf {
    let relative: PathBuf = source
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    dest_dir.join(relative)
}
