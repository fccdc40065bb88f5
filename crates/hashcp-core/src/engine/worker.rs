//! Worker thread: pull tasks from the inbox, stream them, report results.

use std::sync::mpsc::{Receiver, Sender};
use std::thread::JoinHandle;

use crate::control::{CancelToken, CopyAborted};
use crate::streamer;

use super::messages::{TaskPayload, VerifyOutcome, WorkerCommand, WorkerId, WorkerReport};

/// Spawn one worker. It announces itself with `Ready`, then serves tasks
/// until it receives `Shutdown` or the supervisor hangs up the inbox.
pub(super) fn spawn(
    id: WorkerId,
    inbox: Receiver<WorkerCommand>,
    reports: Sender<WorkerReport>,
    cancel: CancelToken,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let _ = reports.send(WorkerReport::Ready(id));
        while let Ok(command) = inbox.recv() {
            let task = match command {
                WorkerCommand::Task(task) => task,
                WorkerCommand::Shutdown => break,
            };
            let finished = run_task(&task, &reports, &cancel);
            let _ = reports.send(WorkerReport::Done {
                worker: id,
                finished,
            });
        }
    })
}

/// Run one task and post its terminal report. Returns false when the task
/// was cut short by cancellation (neither completed nor errored).
fn run_task(task: &TaskPayload, reports: &Sender<WorkerReport>, cancel: &CancelToken) -> bool {
    match task {
        TaskPayload::Copy(copy) => {
            let mut emit = |bytes_so_far, bytes_total| {
                let _ = reports.send(WorkerReport::Progress {
                    path: copy.source.clone(),
                    bytes_so_far,
                    bytes_total,
                });
            };
            match streamer::copy_file_hashed(&copy.source, &copy.dest, cancel, &mut emit) {
                Ok(outcome) => {
                    let _ = reports.send(WorkerReport::Hashed {
                        dest: copy.dest.clone(),
                        digest_hex: outcome.digest_hex,
                    });
                    true
                }
                Err(e) if e.downcast_ref::<CopyAborted>().is_some() => false,
                Err(e) => {
                    tracing::warn!(source = %copy.source.display(), "copy failed: {:#}", e);
                    let _ = reports.send(WorkerReport::Error {
                        path: copy.source.clone(),
                        error: format!("{:#}", e),
                    });
                    true
                }
            }
        }
        TaskPayload::Verify(verify) => {
            let mut emit = |bytes_so_far, bytes_total| {
                let _ = reports.send(WorkerReport::Progress {
                    path: verify.path.clone(),
                    bytes_so_far,
                    bytes_total,
                });
            };
            match streamer::hash_file(&verify.path, cancel, &mut emit) {
                Ok(outcome) => {
                    let outcome = if outcome
                        .digest_hex
                        .eq_ignore_ascii_case(&verify.expected_hex)
                    {
                        VerifyOutcome::Ok
                    } else {
                        VerifyOutcome::Mismatch {
                            expected: verify.expected_hex.clone(),
                            actual: outcome.digest_hex,
                        }
                    };
                    let _ = reports.send(WorkerReport::Verified {
                        path: verify.path.clone(),
                        outcome,
                    });
                    true
                }
                Err(e) if e.downcast_ref::<CopyAborted>().is_some() => false,
                Err(e) => {
                    tracing::warn!(path = %verify.path.display(), "verify read failed: {:#}", e);
                    let _ = reports.send(WorkerReport::Error {
                        path: verify.path.clone(),
                        error: format!("{:#}", e),
                    });
                    true
                }
            }
        }
    }
}
