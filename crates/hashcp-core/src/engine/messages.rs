//! Message protocol between the supervisor and its workers.
//!
//! One tagged union per direction so exhaustiveness is compiler-checked and
//! stray fields are impossible. The shared result channel gives the
//! supervisor a total order over worker reports; per-sender FIFO means a
//! task's `Progress` reports always precede its `Done`.

use std::path::{Path, PathBuf};

/// Index of a worker; doubles as the handle the supervisor uses to find the
/// worker's inbox and in-flight slot.
pub(crate) type WorkerId = usize;

/// One file to copy. The destination is pre-computed by the supervisor so
/// workers do no path math.
#[derive(Debug, Clone)]
pub(crate) struct CopyTask {
    pub source: PathBuf,
    pub dest: PathBuf,
}

/// One file to re-hash against an expected digest.
#[derive(Debug, Clone)]
pub(crate) struct VerifyTask {
    pub path: PathBuf,
    pub expected_hex: String,
}

#[derive(Debug, Clone)]
pub(crate) enum TaskPayload {
    Copy(CopyTask),
    Verify(VerifyTask),
}

impl TaskPayload {
    /// The path shown in progress events for this task: the source for a
    /// copy, the listed path for a verify.
    pub(crate) fn event_path(&self) -> &Path {
        match self {
            TaskPayload::Copy(task) => &task.source,
            TaskPayload::Verify(task) => &task.path,
        }
    }
}

/// Supervisor → worker.
pub(crate) enum WorkerCommand {
    Task(TaskPayload),
    Shutdown,
}

/// Outcome of one verify comparison.
#[derive(Debug, Clone)]
pub(crate) enum VerifyOutcome {
    Ok,
    Mismatch { expected: String, actual: String },
}

/// Worker → supervisor. Per task a worker posts zero or more `Progress`,
/// zero or one `Hashed`/`Verified`/`Error`, then exactly one `Done`.
pub(crate) enum WorkerReport {
    /// Posted once on spawn, before the first inbox receive.
    Ready(WorkerId),
    Progress {
        path: PathBuf,
        bytes_so_far: u64,
        bytes_total: u64,
    },
    Hashed {
        dest: PathBuf,
        digest_hex: String,
    },
    Verified {
        path: PathBuf,
        outcome: VerifyOutcome,
    },
    Error {
        path: PathBuf,
        error: String,
    },
    /// Always the last report for a task, after success or error alike.
    /// `finished` is false when the task was cut short by cancellation.
    Done { worker: WorkerId, finished: bool },
}
