//! The run supervisor: queue, dispatch, counters, event emission.
//!
//! One instance per copy-run or verify-run. The shared result channel is the
//! authoritative serialization point: counters, manifest accumulation and
//! progress events are all updated from this loop. Dispatch runs once per
//! loop iteration at the tail.

use anyhow::Result;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Sender};
use std::thread::JoinHandle;

use crate::control::CancelToken;
use crate::manifest::HashLine;

use super::messages::{TaskPayload, VerifyOutcome, WorkerCommand, WorkerId, WorkerReport};
use super::progress::ProgressEvent;
use super::worker;
use super::ProgressFn;

/// Aggregated results of a run, filled from worker reports in completion
/// order.
#[derive(Default)]
pub(super) struct Aggregates {
    pub(super) hash_lines: Vec<HashLine>,
    pub(super) copied_dests: Vec<PathBuf>,
    pub(super) ok: usize,
    pub(super) mismatched_paths: Vec<PathBuf>,
    pub(super) error_paths: Vec<PathBuf>,
}

pub(super) struct RunOutcome {
    pub(super) agg: Aggregates,
    pub(super) cancelled: bool,
}

pub(super) struct Supervisor {
    queue: VecDeque<TaskPayload>,
    total_files: usize,
    worker_count: usize,
    completed_files: usize,
    active: usize,
    shutting_down: bool,
    idle: Vec<WorkerId>,
    inboxes: Vec<Sender<WorkerCommand>>,
    in_flight: Vec<Option<PathBuf>>,
    handles: Vec<JoinHandle<()>>,
    cancel: CancelToken,
    on_progress: Option<ProgressFn>,
    agg: Aggregates,
}

impl Supervisor {
    pub(super) fn new(
        tasks: Vec<TaskPayload>,
        worker_count: usize,
        cancel: CancelToken,
        on_progress: Option<ProgressFn>,
    ) -> Self {
        let total_files = tasks.len();
        Self {
            queue: tasks.into(),
            total_files,
            worker_count: worker_count.max(1),
            completed_files: 0,
            active: 0,
            shutting_down: false,
            idle: Vec::new(),
            inboxes: Vec::new(),
            in_flight: Vec::new(),
            handles: Vec::new(),
            cancel,
            on_progress,
            agg: Aggregates::default(),
        }
    }

    /// Drive the run to quiescence or cancellation.
    pub(super) fn run(mut self) -> Result<RunOutcome> {
        self.emit(ProgressEvent::Overall {
            completed_files: 0,
            total_files: self.total_files,
        });
        if self.total_files == 0 || self.cancel.is_cancelled() {
            return Ok(self.into_outcome());
        }

        let worker_count = self.worker_count.min(self.total_files);
        let (report_tx, report_rx) = channel();
        for id in 0..worker_count {
            let (command_tx, command_rx) = channel();
            self.inboxes.push(command_tx);
            self.in_flight.push(None);
            self.handles
                .push(worker::spawn(id, command_rx, report_tx.clone(), self.cancel.clone()));
        }
        drop(report_tx);
        tracing::debug!(workers = worker_count, files = self.total_files, "workers spawned");

        loop {
            let report = match report_rx.recv() {
                Ok(report) => report,
                // All report senders gone without a clean shutdown.
                Err(_) => break,
            };
            self.handle(report);
            if self.cancel.is_cancelled() && !self.shutting_down {
                tracing::info!("cancellation observed, stopping dispatch");
                self.begin_shutdown();
            }
            if !self.shutting_down {
                self.dispatch();
                if self.queue.is_empty() && self.active == 0 {
                    self.begin_shutdown();
                }
            }
            if self.shutting_down && self.active == 0 {
                break;
            }
        }

        // Hang up the inboxes so workers that never saw a Shutdown exit too.
        self.inboxes.clear();
        let handles = std::mem::take(&mut self.handles);
        for handle in handles {
            if handle.join().is_err() {
                anyhow::bail!("worker thread panicked");
            }
        }
        Ok(self.into_outcome())
    }

    fn handle(&mut self, report: WorkerReport) {
        match report {
            WorkerReport::Ready(worker) => {
                if self.shutting_down {
                    let _ = self.inboxes[worker].send(WorkerCommand::Shutdown);
                } else {
                    self.idle.push(worker);
                }
            }
            WorkerReport::Progress {
                path,
                bytes_so_far,
                bytes_total,
            } => {
                self.emit(ProgressEvent::FileProgress {
                    path,
                    bytes_so_far,
                    bytes_total,
                });
            }
            WorkerReport::Hashed { dest, digest_hex } => {
                self.agg.copied_dests.push(dest.clone());
                self.agg.hash_lines.push(HashLine {
                    digest_hex,
                    path: dest,
                });
            }
            WorkerReport::Verified { path, outcome } => match outcome {
                VerifyOutcome::Ok => self.agg.ok += 1,
                VerifyOutcome::Mismatch { expected, actual } => {
                    tracing::warn!(
                        path = %path.display(),
                        expected = %expected,
                        actual = %actual,
                        "digest mismatch"
                    );
                    self.agg.mismatched_paths.push(path);
                }
            },
            WorkerReport::Error { path, error: _ } => {
                // The worker already logged the error with full context.
                self.agg.error_paths.push(path);
            }
            WorkerReport::Done { worker, finished } => {
                self.active -= 1;
                let path = self.in_flight[worker].take();
                if finished {
                    self.completed_files += 1;
                    if let Some(path) = path {
                        self.emit(ProgressEvent::FileDone {
                            path,
                            completed_files: self.completed_files,
                            total_files: self.total_files,
                        });
                    }
                    self.emit(ProgressEvent::Overall {
                        completed_files: self.completed_files,
                        total_files: self.total_files,
                    });
                }
                if self.shutting_down {
                    let _ = self.inboxes[worker].send(WorkerCommand::Shutdown);
                } else {
                    self.idle.push(worker);
                }
            }
        }
    }

    /// Hand one queued task to each idle worker. The pool has no internal
    /// queueing; a worker holds at most one task.
    fn dispatch(&mut self) {
        while !self.shutting_down && !self.cancel.is_cancelled() {
            if self.idle.is_empty() || self.queue.is_empty() {
                break;
            }
            let Some(worker) = self.idle.pop() else { break };
            let Some(task) = self.queue.pop_front() else {
                self.idle.push(worker);
                break;
            };
            self.in_flight[worker] = Some(task.event_path().to_path_buf());
            self.active += 1;
            let _ = self.inboxes[worker].send(WorkerCommand::Task(task));
        }
    }

    fn begin_shutdown(&mut self) {
        self.shutting_down = true;
        for worker in self.idle.drain(..) {
            let _ = self.inboxes[worker].send(WorkerCommand::Shutdown);
        }
    }

    fn emit(&mut self, event: ProgressEvent) {
        if let Some(on_progress) = self.on_progress.as_mut() {
            on_progress(event);
        }
    }

    fn into_outcome(self) -> RunOutcome {
        RunOutcome {
            cancelled: self.cancel.is_cancelled(),
            agg: self.agg,
        }
    }
}
