//! SHA-1 hashing for the copy pipeline.
//!
//! The streamer feeds every chunk it writes through `StreamingSha1`, so the
//! digest is computed in the same pass as the copy. `sha1_path` is the
//! standalone whole-file variant used by the CLI checksum command.

use anyhow::{Context, Result};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Chunked SHA-1 accumulator. Zero-length updates are no-ops.
#[derive(Default)]
pub struct StreamingSha1 {
    inner: Sha1,
}

impl StreamingSha1 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    /// Finish the digest and return it as 40-char lowercase hex (the
    /// `sha1sum` convention). The accumulator is reset and can be reused.
    pub fn finalize_hex(&mut self) -> String {
        hex::encode(self.inner.finalize_reset())
    }

    /// Discard accumulated state without producing a digest.
    pub fn reset(&mut self) {
        Digest::reset(&mut self.inner);
    }
}

/// Compute SHA-1 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn sha1_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = StreamingSha1::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize_hex())
}
