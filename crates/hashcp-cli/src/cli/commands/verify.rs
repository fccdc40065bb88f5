//! `hashcp verify` – re-hash a manifest's entries and compare digests.

use anyhow::Result;
use std::path::Path;

use hashcp_core::config::HashcpConfig;
use hashcp_core::control::CancelToken;
use hashcp_core::engine::{self, VerifyOptions};

use super::{cancel_on_ctrl_c, nonzero, progress_printer};

pub async fn run_verify(
    cfg: &HashcpConfig,
    manifest: &Path,
    workers: Option<usize>,
    quiet: bool,
) -> Result<()> {
    let cancel = CancelToken::new();
    cancel_on_ctrl_c(&cancel);

    let opts = VerifyOptions {
        worker_count: workers.or(nonzero(cfg.worker_count)),
        on_progress: progress_printer(quiet, cfg.progress_interval_ms),
        cancel: Some(cancel),
    };
    let summary = engine::verify_from_manifest(manifest, opts).await?;

    println!(
        "{} ok, {} mismatched, {} unreadable (of {})",
        summary.ok, summary.mismatched, summary.errors, summary.total
    );
    for path in &summary.mismatched_paths {
        println!("  mismatch: {}", path.display());
    }
    for path in &summary.error_paths {
        println!("  unreadable: {}", path.display());
    }
    if summary.cancelled {
        println!("cancelled: counts are partial");
    }

    if summary.mismatched > 0 || summary.errors > 0 {
        anyhow::bail!(
            "verification failed: {} mismatched, {} unreadable",
            summary.mismatched,
            summary.errors
        );
    }
    Ok(())
}
