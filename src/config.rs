//! Configuration management for Queuechat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{QueuechatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for Queuechat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Queue polling settings
    #[serde(default)]
    pub polling: PollingConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the chat backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Session cookie from a previous login (prefer QUEUECHAT_SESSION_TOKEN)
    #[serde(default, skip_serializing)]
    pub session_token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("queuechat/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            session_token: None,
        }
    }
}

/// Queue polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between the end of one poll tick and the start of the next
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    5
}

/// Maximum accepted poll interval
const MAX_INTERVAL_SECS: u64 = 3600;

impl PollingConfig {
    /// Poll delay as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON-formatted logs
    #[serde(default)]
    pub json_format: bool,

    /// Log file path (if None, STDERR only)
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| QueuechatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| QueuechatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("QUEUECHAT_API_URL") {
            self.api.base_url = url;
        }

        if let Ok(token) = std::env::var("QUEUECHAT_SESSION_TOKEN") {
            self.api.session_token = Some(token);
        }

        if let Ok(timeout) = std::env::var("QUEUECHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_secs = value;
            } else {
                tracing::warn!("Invalid QUEUECHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(interval) = std::env::var("QUEUECHAT_POLL_INTERVAL_SECONDS") {
            if let Ok(value) = interval.parse() {
                self.polling.interval_secs = value;
            } else {
                tracing::warn!("Invalid QUEUECHAT_POLL_INTERVAL_SECONDS: {}", interval);
            }
        }

        if let Ok(level) = std::env::var("QUEUECHAT_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(json) = std::env::var("QUEUECHAT_LOG_JSON") {
            self.logging.json_format = matches!(json.to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.api_url {
            self.api.base_url = url.clone();
        }

        if cli.verbose {
            self.logging.level = "debug".to_string();
        }

        if cli.json_logs {
            self.logging.json_format = true;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(QueuechatError::Config("api.base_url cannot be empty".to_string()).into());
        }

        let parsed = url::Url::parse(&self.api.base_url).map_err(|e| {
            QueuechatError::Config(format!("Invalid api.base_url {}: {}", self.api.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(QueuechatError::Config(format!(
                "api.base_url must use http or https, got {}",
                parsed.scheme()
            ))
            .into());
        }

        if self.api.timeout_secs == 0 {
            return Err(QueuechatError::Config(
                "api.timeout_secs must be greater than 0".to_string(),
            )
            .into());
        }

        if self.polling.interval_secs == 0 {
            return Err(QueuechatError::Config(
                "polling.interval_secs must be greater than 0".to_string(),
            )
            .into());
        }

        if self.polling.interval_secs > MAX_INTERVAL_SECS {
            return Err(QueuechatError::Config(format!(
                "polling.interval_secs must be less than or equal to {}",
                MAX_INTERVAL_SECS
            ))
            .into());
        }

        Ok(())
    }
}
