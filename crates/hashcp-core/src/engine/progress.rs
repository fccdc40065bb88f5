//! Progress events and run summaries.
//!
//! Events are emitted only from the supervisor loop, so the caller sees a
//! single sequential stream; `completed_files` never regresses within a run.

use std::path::PathBuf;

/// Event stream a run forwards to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Periodic per-file progress, throttled to at most one per ~100 ms per
    /// file. Never arrives after that file's `FileDone`.
    FileProgress {
        path: PathBuf,
        bytes_so_far: u64,
        bytes_total: u64,
    },
    /// Exactly one per finished task, success or error.
    FileDone {
        path: PathBuf,
        completed_files: usize,
        total_files: usize,
    },
    /// Overall counters: once at run start (0/total) and after each
    /// `FileDone`.
    Overall {
        completed_files: usize,
        total_files: usize,
    },
}

/// Result of a copy run.
#[derive(Debug, Clone)]
pub struct CopySummary {
    /// Tasks enqueued after filtering blank lines and directories.
    pub total: usize,
    pub copied: usize,
    pub errored: usize,
    /// Source paths of failed tasks, in completion order.
    pub errored_sources: Vec<PathBuf>,
    /// Where the manifest was written.
    pub manifest_path: PathBuf,
    /// True when the run was cancelled; artifacts reflect partial results.
    pub cancelled: bool,
}

/// Result of a verify run. A mismatch is not an error; unreadable files are.
#[derive(Debug, Clone, Default)]
pub struct VerifySummary {
    pub total: usize,
    pub ok: usize,
    pub mismatched: usize,
    pub errors: usize,
    pub mismatched_paths: Vec<PathBuf>,
    pub error_paths: Vec<PathBuf>,
    /// True when the run was cancelled; counts are partial.
    pub cancelled: bool,
}
