//! Subcommand implementations.

pub mod checksum;
pub mod copy;
pub mod verify;

use std::time::Instant;

use hashcp_core::control::CancelToken;
use hashcp_core::engine::{ProgressEvent, ProgressFn};

/// Treat a configured 0 as "unset" so the engine falls back to the CPU count.
pub(crate) fn nonzero(n: usize) -> Option<usize> {
    if n == 0 {
        None
    } else {
        Some(n)
    }
}

/// Trip the run's cancel token on Ctrl-C so partial artifacts get written.
pub(crate) fn cancel_on_ctrl_c(cancel: &CancelToken) {
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ninterrupt: stopping dispatch, writing partial results");
            token.cancel();
        }
    });
}

/// Line-based progress printer, throttled to one in-flight line per interval.
/// Completion lines are always printed.
pub(crate) fn progress_printer(quiet: bool, interval_ms: u64) -> Option<ProgressFn> {
    if quiet {
        return None;
    }
    let mut last_print = Instant::now();
    Some(Box::new(move |event| match event {
        ProgressEvent::FileProgress {
            path,
            bytes_so_far,
            bytes_total,
        } => {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= interval_ms {
                let done_mib = bytes_so_far as f64 / 1_048_576.0;
                let total_mib = bytes_total as f64 / 1_048_576.0;
                let pct = if bytes_total > 0 {
                    bytes_so_far as f64 / bytes_total as f64 * 100.0
                } else {
                    100.0
                };
                println!(
                    "  {}: {:.1} / {:.1} MiB ({:.1}%)",
                    path.display(),
                    done_mib,
                    total_mib,
                    pct
                );
                last_print = now;
            }
        }
        ProgressEvent::FileDone {
            path,
            completed_files,
            total_files,
        } => {
            println!("[{}/{}] {}", completed_files, total_files, path.display());
        }
        ProgressEvent::Overall { .. } => {}
    }))
}
