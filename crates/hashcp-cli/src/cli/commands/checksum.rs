//! Checksum command: compute SHA-1 of files.

use anyhow::Result;
use hashcp_core::checksum;
use std::path::PathBuf;

/// Compute and print the SHA-1 of each file, sha1sum-style.
pub async fn run_checksum(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let digest = checksum::sha1_path(path)?;
        println!("{}  {}", digest, path.display());
    }
    Ok(())
}
