//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, the exam to follow, the countdown
//! refresh interval, the session storage backend and the last used phone
//! number.
//!
//! Configuration is stored at `~/.config/examgate/config.json`. The
//! `EXAMGATE_API_BASE_URL` environment variable overrides the base URL.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::auth::{FileStorage, KeyValueStorage, KeyringStorage};

/// Application name used for config/data directory paths
const APP_NAME: &str = "examgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured API base URL
pub const API_BASE_URL_ENV: &str = "EXAMGATE_API_BASE_URL";

/// Base URL including the API prefix
const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

const DEFAULT_EXAM_ID: u32 = 1;

/// Seconds between countdown refetches while watching.
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Lower bound so a misconfigured interval cannot hammer the server.
const MIN_REFRESH_INTERVAL_SECS: u64 = 5;

/// Where the session record is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub exam_id: u32,
    pub refresh_interval_secs: u64,
    pub storage: StorageBackend,
    pub last_phone_number: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            exam_id: DEFAULT_EXAM_ID,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            storage: StorageBackend::default(),
            last_phone_number: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
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

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the file-backed session record.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Effective API base URL: environment, then config file, then default.
    pub fn api_base_url(&self) -> String {
        self.resolve_api_base_url(std::env::var(API_BASE_URL_ENV).ok())
    }

    fn resolve_api_base_url(&self, env_value: Option<String>) -> String {
        env_value
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval_or(None)
    }

    /// Refresh interval with an optional override (e.g. from the command
    /// line). Both sources are held to the same floor.
    pub fn refresh_interval_or(&self, override_secs: Option<u64>) -> Duration {
        let secs = override_secs.unwrap_or(self.refresh_interval_secs);
        Duration::from_secs(secs.max(MIN_REFRESH_INTERVAL_SECS))
    }

    /// Open the configured session storage backend.
    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStorage>> {
        let storage: Arc<dyn KeyValueStorage> = match self.storage {
            StorageBackend::File => Arc::new(FileStorage::new(self.data_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStorage::new()),
        };
        Ok(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"exam_id": 3, "storage": "keyring"}"#).expect("parse config");
        assert_eq!(config.exam_id, 3);
        assert_eq!(config.storage, StorageBackend::Keyring);
        assert_eq!(config.refresh_interval_secs, DEFAULT_REFRESH_INTERVAL_SECS);
        assert!(config.api_base_url.is_none());
    }

    #[test]
    fn test_api_base_url_precedence() {
        let mut config = Config::default();
        assert_eq!(config.resolve_api_base_url(None), DEFAULT_API_BASE_URL);

        config.api_base_url = Some("https://portal.example/api".to_string());
        assert_eq!(config.resolve_api_base_url(None), "https://portal.example/api");
        assert_eq!(
            config.resolve_api_base_url(Some("http://10.0.0.1:8080/api".to_string())),
            "http://10.0.0.1:8080/api"
        );
        assert_eq!(
            config.resolve_api_base_url(Some("  ".to_string())),
            "https://portal.example/api"
        );
    }

    #[test]
    fn test_refresh_interval_has_floor() {
        let config = Config {
            refresh_interval_secs: 1,
            ..Config::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_secs(MIN_REFRESH_INTERVAL_SECS));
    }

    #[test]
    fn test_refresh_interval_override_has_floor() {
        let config = Config::default();
        assert_eq!(config.refresh_interval_or(Some(30)), Duration::from_secs(30));
        assert_eq!(
            config.refresh_interval_or(Some(0)),
            Duration::from_secs(MIN_REFRESH_INTERVAL_SECS)
        );
        assert_eq!(
            config.refresh_interval_or(None),
            Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS)
        );
    }
}
