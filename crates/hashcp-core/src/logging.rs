//! Logging init: append to a log file under the XDG state dir, with a
//! plain-stderr fallback for when the state dir is unusable.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,hashcp_core=debug";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Path of the log file: `~/.local/state/hashcp/hashcp.log`.
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hashcp")?;
    Ok(xdg_dirs.get_state_home().join("hashcp.log"))
}

/// Initialize structured logging to the state-dir log file. All threads
/// append through one shared handle. Returns Err when the directory or file
/// cannot be opened, so the caller can pick the stderr fallback instead.
pub fn init_logging() -> Result<()> {
    let path = log_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("create log dir {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    tracing::debug!(path = %path.display(), "logging to file");
    Ok(())
}

/// Stderr-only logging, for when [`init_logging`] cannot reach its file.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
