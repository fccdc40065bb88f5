//! `hashcp copy` – run a copy-with-hash batch.

use anyhow::Result;
use std::path::Path;

use hashcp_core::config::HashcpConfig;
use hashcp_core::control::CancelToken;
use hashcp_core::engine::{self, CopyOptions};

use super::{cancel_on_ctrl_c, nonzero, progress_printer};

pub async fn run_copy(
    cfg: &HashcpConfig,
    list: &Path,
    dest: &Path,
    workers: Option<usize>,
    save_lists: bool,
    quiet: bool,
) -> Result<()> {
    let cancel = CancelToken::new();
    cancel_on_ctrl_c(&cancel);

    let opts = CopyOptions {
        worker_count: workers.or(nonzero(cfg.worker_count)),
        save_lists: save_lists || cfg.save_lists,
        on_progress: progress_printer(quiet, cfg.progress_interval_ms),
        cancel: Some(cancel),
    };
    let summary = engine::copy_from_list(list, dest, opts).await?;

    if summary.cancelled {
        println!(
            "cancelled: {} of {} file(s) copied",
            summary.copied, summary.total
        );
    } else {
        println!(
            "copied {} of {} file(s), {} error(s)",
            summary.copied, summary.total, summary.errored
        );
    }
    for source in &summary.errored_sources {
        println!("  error: {}", source.display());
    }
    println!("manifest: {}", summary.manifest_path.display());

    if summary.errored > 0 {
        anyhow::bail!("{} file(s) failed to copy", summary.errored);
    }
    Ok(())
}
