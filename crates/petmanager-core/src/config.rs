//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! API location, request timeout, refresh policy, where tokens are kept,
//! and the last used username.
//!
//! Configuration is stored at `~/.config/petmanager/config.json`. The API
//! URL and timeout can be overridden with `PETMANAGER_API_URL` and
//! `PETMANAGER_TIMEOUT_SECS`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{FileStorage, KeyringStorage, RefreshPolicy, TokenStorage};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "petmanager";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Remote API used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "https://pet-manager-api.geia.vip";

pub const ENV_API_URL: &str = "PETMANAGER_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "PETMANAGER_TIMEOUT_SECS";

/// Where access and refresh tokens are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Unset means no client-side timeout
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
    #[serde(default)]
    pub token_storage: StorageBackend,
    #[serde(default)]
    pub last_username: Option<String>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: None,
            refresh_policy: RefreshPolicy::default(),
            token_storage: StorageBackend::default(),
            last_username: None,
            log_dir: None,
        }
    }
}

impl Config {
    /// Read the config file, or defaults when there is none.
    ///
    /// Environment overrides are not applied here; call
    /// [`Config::apply_overrides`] once logging is up so rejected values get
    /// reported.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents).context("Failed to parse config file")
    }


    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides looked up by variable name. Returns the variables
    /// whose values were rejected.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
        let mut rejected = Vec::new();
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = Some(secs),
                _ => {
                    warn!(value = %raw, "Ignoring invalid {}", ENV_TIMEOUT_SECS);
                    rejected.push(ENV_TIMEOUT_SECS);
                }
            }
        }
        rejected
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Open the configured token storage backend.
    pub fn open_token_storage(&self) -> Result<Arc<dyn TokenStorage>> {
        let storage: Arc<dyn TokenStorage> = match self.token_storage {
            StorageBackend::File => Arc::new(FileStorage::new(self.cache_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStorage::new()),
        };
        Ok(storage)
    }
}
