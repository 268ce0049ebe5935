//! Client configuration
//!
//! Configuration is organized into three sections: the service endpoint,
//! the timer cadences, and logging. Everything has working defaults; a JSON
//! file under the user config directory and a pair of environment
//! variables can override them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::domain::constants::timing;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "CPK_CLIENT_CONFIG";
/// Environment variable overriding the service base URL.
pub const SERVER_URL_ENV: &str = "CPK_SERVER_URL";

const CONFIG_DIR_NAME: &str = "cpk-cloud-client";
const CONFIG_FILE_NAME: &str = "config.json";

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub service: ServiceConfig,
    pub timing: TimingConfig,
    pub logging: LoggingConfig,
}

/// Service endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the classification service.
    pub base_url: String,
    /// Timeout for status/stats/health requests, in seconds.
    pub request_timeout_secs: u64,
    /// Timeout for the upload request. Point clouds are large; uploads get
    /// their own, much longer budget.
    pub upload_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 30,
            upload_timeout_secs: 600,
            user_agent: "cpk-cloud-client/0.1".to_string(),
        }
    }
}

/// Cadences of the two recurring background tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub status_poll_interval_ms: u64,
    pub progress_tick_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            status_poll_interval_ms: timing::DEFAULT_STATUS_POLL_INTERVAL_MS,
            progress_tick_interval_ms: timing::DEFAULT_PROGRESS_TICK_INTERVAL_MS,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset.
    pub level: String,
    /// Also write logs to a rolling file next to the executable.
    pub file_output: bool,
    /// Log directory override.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_output: false,
            directory: None,
        }
    }
}

impl ClientConfig {
    /// Default config file location.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Resolve the config file path, honoring the env override.
    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_config_path())
    }

    /// Load configuration from disk, falling back to defaults when no file
    /// exists, then apply environment overrides.
    pub async fn load() -> Result<Self> {
        let path = Self::config_path();
        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Self = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file: {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            config
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Persist the configuration, creating parent directories as needed.
    pub async fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var(SERVER_URL_ENV) {
            if !base_url.is_empty() {
                self.service.base_url = base_url;
            }
        }
    }
}
