//! One-file streaming copy with inline hashing.
//!
//! Reads the source in chunks; each chunk is written to the destination and
//! then fed to the SHA-1 accumulator, so the digest and the copy observe the
//! same byte sequence in a single pass. `hash_file` is the verification
//! variant: the same loop without a destination.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::checksum::StreamingSha1;
use crate::control::{CancelToken, CopyAborted};

const BUF_SIZE: usize = 64 * 1024;

/// Minimum interval between progress emissions for one file.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a successful stream: the digest and how many bytes went through.
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    pub digest_hex: String,
    pub bytes: u64,
}

/// Copy `source` to `dest` (create-or-truncate), hashing every byte written.
///
/// `emit` receives `(bytes_so_far, bytes_total)` at most once per
/// [`PROGRESS_INTERVAL`]; small files may finish without any emission. The
/// destination's parent directory must already exist. On failure the partial
/// destination is left in place. Cancellation mid-stream returns
/// [`CopyAborted`] (detectable via `downcast_ref`).
pub fn copy_file_hashed(
    source: &Path,
    dest: &Path,
    cancel: &CancelToken,
    emit: &mut dyn FnMut(u64, u64),
) -> Result<StreamOutcome> {
    let mut reader =
        File::open(source).with_context(|| format!("open source {}", source.display()))?;
    let bytes_total = reader
        .metadata()
        .with_context(|| format!("stat source {}", source.display()))?
        .len();
    let mut writer = File::create(dest)
        .with_context(|| format!("create destination {}", dest.display()))?;

    let mut hasher = StreamingSha1::new();
    let mut buf = [0u8; BUF_SIZE];
    let mut bytes_so_far = 0u64;
    let mut last_emit = Instant::now();

    loop {
        if cancel.is_cancelled() {
            return Err(CopyAborted.into());
        }
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("read {}", source.display()))?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .with_context(|| format!("write {}", dest.display()))?;
        hasher.update(&buf[..n]);
        bytes_so_far += n as u64;
        if last_emit.elapsed() >= PROGRESS_INTERVAL {
            emit(bytes_so_far, bytes_total);
            last_emit = Instant::now();
        }
    }

    writer
        .flush()
        .with_context(|| format!("flush {}", dest.display()))?;
    drop(writer);

    Ok(StreamOutcome {
        digest_hex: hasher.finalize_hex(),
        bytes: bytes_so_far,
    })
}

/// Read and hash `path` without writing anywhere (the verify variant).
/// Same chunking, throttle and cancellation behavior as [`copy_file_hashed`].
pub fn hash_file(
    path: &Path,
    cancel: &CancelToken,
    emit: &mut dyn FnMut(u64, u64),
) -> Result<StreamOutcome> {
    let mut reader = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let bytes_total = reader
        .metadata()
        .with_context(|| format!("stat {}", path.display()))?
        .len();

    let mut hasher = StreamingSha1::new();
    let mut buf = [0u8; BUF_SIZE];
    let mut bytes_so_far = 0u64;
    let mut last_emit = Instant::now();

    loop {
        if cancel.is_cancelled() {
            return Err(CopyAborted.into());
        }
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        bytes_so_far += n as u64;
        if last_emit.elapsed() >= PROGRESS_INTERVAL {
            emit(bytes_so_far, bytes_total);
            last_emit = Instant::now();
        }
    }

    Ok(StreamOutcome {
        digest_hex: hasher.finalize_hex(),
        bytes: bytes_so_far,
    })
}
