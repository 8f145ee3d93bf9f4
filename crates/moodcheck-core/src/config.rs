//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! backend address, token storage backend, timing knobs and the last used
//! username.
//!
//! Configuration is stored at `~/.config/moodcheck/config.json`. The
//! backend address can be overridden with `MOODCHECK_API_URL`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::{DEFAULT_API_URL, REQUEST_TIMEOUT_SECS};
use crate::auth::{SessionStore, StorageKind};
use crate::views::DEFAULT_REDIRECT_DELAY;

/// Application name used for config/data directory paths
const APP_NAME: &str = "moodcheck";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the backend address
pub const API_URL_ENV: &str = "MOODCHECK_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub last_username: Option<String>,
    pub storage: StorageKind,
    pub redirect_delay_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Self::path()?)
    }

    pub fn load_from(path: PathBuf) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(&path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Self::path()?)
    }

    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Location of the config file
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Per-user directory for the session file and logs
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_NAME))
    }

    /// Backend address: environment, then config file, then the default.
    pub fn api_url(&self) -> String {
        self.api_url_with(std::env::var(API_URL_ENV).ok())
    }

    fn api_url_with(&self, env_url: Option<String>) -> String {
        env_url
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn redirect_delay(&self) -> Duration {
        self.redirect_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REDIRECT_DELAY)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS))
    }

    /// Session store on the configured backend
    pub fn session_store(&self) -> SessionStore {
        SessionStore::open(self.storage, Self::data_dir())
    }
}
