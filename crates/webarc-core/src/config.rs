use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::{FetchOptions, DEFAULT_USER_AGENT};

/// Global configuration loaded from `~/.config/webarc/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebarcConfig {
    /// Whole-request timeout in seconds for page and asset fetches.
    pub http_timeout_secs: u64,
    /// Connect-phase timeout in seconds.
    pub connect_timeout_secs: u64,
    /// User-Agent header presented to servers.
    pub user_agent: String,
    /// Optional redirect hop limit (None = library default).
    #[serde(default)]
    pub max_redirects: Option<u32>,
}

impl Default for WebarcConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: 100,
            connect_timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: None,
        }
    }
}

impl WebarcConfig {
    /// Fetch options for one session under this config.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_redirects: self.max_redirects,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("webarc")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<WebarcConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = WebarcConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: WebarcConfig = toml::from_str(&data)?;
    Ok(cfg)
}
