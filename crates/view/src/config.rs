use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controller::ControllerOptions;
use crate::title::DEFAULT_PRODUCT_NAME;

/// Top-level viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ViewerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub view: ViewSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_product_name")]
    pub product_name: String,
    /// Start in the denser, everything-at-once layout.
    #[serde(default)]
    pub dense: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            product_name: default_product_name(),
            dense: false,
        }
    }
}

impl ViewerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            poll_interval: Duration::from_millis(self.view.poll_interval_ms),
            product_name: self.view.product_name.clone(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_product_name() -> String {
    DEFAULT_PRODUCT_NAME.to_string()
}

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("buildview"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load the config from the default location, or defaults if it does not exist.
pub fn load_config() -> Result<ViewerConfig> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<ViewerConfig> {
    if !path.exists() {
        return Ok(ViewerConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read viewer config at {}", path.display()))?;
    let config: ViewerConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse viewer config at {}", path.display()))?;
    Ok(config)
}
