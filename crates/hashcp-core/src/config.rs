use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/hashcp/config.toml`.
///
/// Per-run CLI flags override these values; the engine itself only sees the
/// resolved options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashcpConfig {
    /// Worker threads per run; 0 means the logical CPU count.
    pub worker_count: usize,
    /// Whether copy runs write `copied.txt`/`errored.txt` by default.
    pub save_lists: bool,
    /// Minimum milliseconds between CLI progress lines.
    pub progress_interval_ms: u64,
}

impl Default for HashcpConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            save_lists: false,
            progress_interval_ms: 500,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hashcp")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HashcpConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HashcpConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: HashcpConfig = toml::from_str(&data)?;
    Ok(cfg)
}
