//! Manifest I/O: the `hashes.sha1` file pairing digests to destination paths.
//!
//! Lines render as `<hex>␠␠<path>\n` (two ASCII spaces, `sha1sum`
//! compatible). Parsing splits each line at the first whitespace run and
//! silently skips lines with fewer than two fields. Line order reflects task
//! completion order, not input order; verification is order-independent.

use anyhow::{Context, Result};
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Manifest filename created in the destination directory.
pub const MANIFEST_NAME: &str = "hashes.sha1";

/// One manifest entry: a digest and the path it was computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashLine {
    pub digest_hex: String,
    pub path: PathBuf,
}

impl HashLine {
    /// Render as `digest␠␠path` with a trailing newline.
    pub fn render(&self) -> String {
        format!("{}  {}\n", self.digest_hex, self.path.display())
    }
}

/// Error raised when a manifest parses to zero entries.
#[derive(Debug)]
pub struct EmptyManifest(pub PathBuf);

impl std::fmt::Display for EmptyManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "manifest {} contains no entries", self.0.display())
    }
}

impl std::error::Error for EmptyManifest {}

/// Parse one manifest line. Returns `None` when the line is blank or does not
/// have two fields. The digest is the text up to the first whitespace run;
/// the path is everything after it, trimmed.
pub fn parse_line(line: &str) -> Option<HashLine> {
    let line = line.trim();
    let split = line.find(|c: char| c.is_whitespace())?;
    let digest = &line[..split];
    let path = line[split..].trim_start();
    if path.is_empty() {
        return None;
    }
    Some(HashLine {
        digest_hex: digest.to_string(),
        path: PathBuf::from(path),
    })
}

/// Read and parse a manifest file. Unrecognized lines are skipped; deciding
/// whether zero entries is an error is left to the verify run.
pub fn parse_manifest(path: &Path) -> Result<Vec<HashLine>> {
    let file =
        fs::File::open(path).with_context(|| format!("open manifest {}", path.display()))?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("read manifest {}", path.display()))?;
        if let Some(entry) = parse_line(&line) {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Remove a stale manifest so a new run starts clean. A missing file is fine.
pub fn remove_stale(dest_dir: &Path) -> Result<()> {
    let path = dest_dir.join(MANIFEST_NAME);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("remove stale manifest {}", path.display()))
        }
    }
}

/// Append accumulated hash lines to `<dest_dir>/hashes.sha1` and return the
/// manifest path. Called once at finalization; the file was removed at run
/// start, so append mode always starts from the lines of this run.
pub fn append_lines(dest_dir: &Path, lines: &[HashLine]) -> Result<PathBuf> {
    let path = dest_dir.join(MANIFEST_NAME);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open manifest {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writer
            .write_all(line.render().as_bytes())
            .with_context(|| format!("write manifest {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush manifest {}", path.display()))?;
    Ok(path)
}
