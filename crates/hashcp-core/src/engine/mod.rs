//! The parallel copy/verify engine.
//!
//! A bounded pool of worker threads streams files while a single supervisor
//! owns the queue, counters, manifest accumulation and the outbound event
//! stream. The public entry points are async and run the blocking supervisor
//! loop on the blocking thread pool.

mod messages;
mod progress;
mod supervisor;
mod worker;

pub use progress::{CopySummary, ProgressEvent, VerifySummary};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::control::CancelToken;
use crate::manifest::{self, EmptyManifest};
use crate::paths;

use messages::{CopyTask, TaskPayload, VerifyTask};
use supervisor::Supervisor;

/// Sink for progress events; invoked from the supervisor loop only, so it is
/// single-threaded from the caller's perspective. Slow sinks back up the
/// pool.
pub type ProgressFn = Box<dyn FnMut(ProgressEvent) + Send>;

/// Options for a copy run.
#[derive(Default)]
pub struct CopyOptions {
    /// Worker threads; defaults to the logical CPU count.
    pub worker_count: Option<usize>,
    /// Also write `copied.txt` and `errored.txt` into the destination.
    pub save_lists: bool,
    pub on_progress: Option<ProgressFn>,
    pub cancel: Option<CancelToken>,
}

/// Options for a verify run.
#[derive(Default)]
pub struct VerifyOptions {
    /// Worker threads; defaults to the logical CPU count.
    pub worker_count: Option<usize>,
    pub on_progress: Option<ProgressFn>,
    pub cancel: Option<CancelToken>,
}

/// Copy every file named by `list_path` to its mirrored location under
/// `dest_dir`, hashing during the copy, and write the `hashes.sha1`
/// manifest. Per-file failures do not abort the run; they are collected in
/// the summary.
pub async fn copy_from_list(
    list_path: &Path,
    dest_dir: &Path,
    opts: CopyOptions,
) -> Result<CopySummary> {
    let list_path = list_path.to_path_buf();
    let dest_dir = dest_dir.to_path_buf();
    tokio::task::spawn_blocking(move || run_copy(&list_path, &dest_dir, opts))
        .await
        .context("copy run join")?
}

/// Re-hash every file listed in `manifest_path` and compare against the
/// recorded digests. Returns a partial summary when cancelled. A manifest
/// that parses to zero entries is an input error, raised before any worker
/// spawns.
pub async fn verify_from_manifest(
    manifest_path: &Path,
    opts: VerifyOptions,
) -> Result<VerifySummary> {
    let manifest_path = manifest_path.to_path_buf();
    tokio::task::spawn_blocking(move || run_verify(&manifest_path, opts))
        .await
        .context("verify run join")?
}

fn run_copy(list_path: &Path, dest_dir: &Path, opts: CopyOptions) -> Result<CopySummary> {
    let sources = paths::read_source_list(list_path)?;
    fs::create_dir_all(dest_dir)
        .with_context(|| format!("create destination {}", dest_dir.display()))?;

    let mut tasks = Vec::with_capacity(sources.len());
    for source in sources {
        let dest = paths::mirror_destination(&source, dest_dir);
        if let Some(parent) = dest.parent() {
            // A failure here surfaces when the worker opens the destination.
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(dir = %parent.display(), "create destination dir failed: {}", e);
            }
        }
        tasks.push(TaskPayload::Copy(CopyTask { source, dest }));
    }
    manifest::remove_stale(dest_dir)?;

    let total = tasks.len();
    let cancel = opts.cancel.unwrap_or_default();
    let worker_count = opts.worker_count.unwrap_or_else(num_cpus::get);
    tracing::info!(
        files = total,
        workers = worker_count,
        dest = %dest_dir.display(),
        "copy run starting"
    );

    let outcome = Supervisor::new(tasks, worker_count, cancel, opts.on_progress).run()?;

    let manifest_path = manifest::append_lines(dest_dir, &outcome.agg.hash_lines)?;
    if opts.save_lists {
        write_path_list(&dest_dir.join("copied.txt"), &outcome.agg.copied_dests)?;
        write_path_list(&dest_dir.join("errored.txt"), &outcome.agg.error_paths)?;
    }
    if outcome.cancelled {
        tracing::info!("run cancelled; manifest and lists reflect partial results");
    }

    Ok(CopySummary {
        total,
        copied: outcome.agg.hash_lines.len(),
        errored: outcome.agg.error_paths.len(),
        errored_sources: outcome.agg.error_paths,
        manifest_path,
        cancelled: outcome.cancelled,
    })
}

fn run_verify(manifest_path: &Path, opts: VerifyOptions) -> Result<VerifySummary> {
    let entries = manifest::parse_manifest(manifest_path)?;
    if entries.is_empty() {
        return Err(EmptyManifest(manifest_path.to_path_buf()).into());
    }

    let tasks: Vec<TaskPayload> = entries
        .into_iter()
        .map(|entry| {
            TaskPayload::Verify(VerifyTask {
                path: entry.path,
                expected_hex: entry.digest_hex,
            })
        })
        .collect();

    let total = tasks.len();
    let cancel = opts.cancel.unwrap_or_default();
    let worker_count = opts.worker_count.unwrap_or_else(num_cpus::get);
    tracing::info!(files = total, workers = worker_count, "verify run starting");

    let outcome = Supervisor::new(tasks, worker_count, cancel, opts.on_progress).run()?;

    Ok(VerifySummary {
        total,
        ok: outcome.agg.ok,
        mismatched: outcome.agg.mismatched_paths.len(),
        errors: outcome.agg.error_paths.len(),
        mismatched_paths: outcome.agg.mismatched_paths,
        error_paths: outcome.agg.error_paths,
        cancelled: outcome.cancelled,
    })
}

/// Write one path per line, newline-terminated; always creates the file,
/// possibly empty.
fn write_path_list(path: &Path, entries: &[PathBuf]) -> Result<()> {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.display().to_string());
        out.push('\n');
    }
    fs::write(path, out).with_context(|| format!("write {}", path.display()))
}
