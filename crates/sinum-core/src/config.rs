//! Client configuration management.
//!
//! This module handles loading and saving the configuration: the controller
//! host, the username, and polling parameters. The password is not stored
//! here; it lives in the OS keychain (see `auth::CredentialStore`).
//!
//! Configuration is stored at `~/.config/sinum/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::auth::Credentials;
use crate::coordinator::DEFAULT_UNAVAILABLE_AFTER;

/// Application name used for the config directory path
const APP_NAME: &str = "sinum";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default poll interval in seconds.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: Option<String>,
    pub username: Option<String>,
    pub scan_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub unavailable_after_failures: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            username: None,
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            unavailable_after_failures: DEFAULT_UNAVAILABLE_AFTER,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Build credentials from the stored host and username plus `password`.
    pub fn credentials(&self, password: &str) -> Result<Credentials> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No host configured. Run `sinum setup` first."))?;
        let username = self
            .username
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No username configured. Run `sinum setup` first."))?;
        Ok(Credentials::new(host, username, password)?)
    }
}
