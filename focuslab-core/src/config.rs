//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/focuslab/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/focuslab/` (~/.config/focuslab/)
//! - State/Logs: `$XDG_STATE_HOME/focuslab/` (~/.local/state/focuslab/)
//!
//! The API key and endpoint can also come from the `FL_API_KEY` and
//! `FL_ENDPOINT` environment variables, or be passed explicitly to
//! [`ApiConfig::resolve`]. Explicit values win over the environment, which
//! wins over the file.

use crate::client::DEFAULT_ENDPOINT;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "FL_API_KEY";

/// Environment variable holding the endpoint
pub const ENDPOINT_ENV: &str = "FL_ENDPOINT";

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// FocusLab API credentials and endpoint
    #[serde(default)]
    pub api: ApiConfig,

    /// Background retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// FocusLab API configuration
#[derive(Deserialize, Clone)]
pub struct ApiConfig {
    /// API key sent in the `X-FL-API-KEY` header
    pub api_key: Option<String>,

    /// Base URL (defaults to `https://api.focuslab.io/api/v1/`)
    pub endpoint: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const REDACTED: &str = "<redacted>";

/// Settings a [`TriggerClient`](crate::TriggerClient) is built from
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("api_key", &REDACTED)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiConfig {
    /// Apply `FL_API_KEY` / `FL_ENDPOINT` from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(api_key) = lookup(API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.api_key = Some(api_key);
        }
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            self.endpoint = Some(endpoint);
        }
        self
    }

    /// Check if an API key is available
    pub fn is_ready(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Resolve client settings.
    ///
    /// Explicit arguments take precedence over configured values. The
    /// endpoint falls back to [`DEFAULT_ENDPOINT`]; the API key has no
    /// default and its absence is a configuration error.
    pub fn resolve(
        &self,
        api_key: Option<String>,
        endpoint: Option<String>,
    ) -> Result<ClientSettings> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.is_empty()))
            .ok_or_else(|| {
                Error::Config(format!(
                    "api.api_key is required (set it in the config file or {})",
                    API_KEY_ENV
                ))
            })?;

        Ok(ClientSettings {
            api_key,
            endpoint: self.resolve_endpoint(endpoint),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }

    /// The endpoint [`resolve`](Self::resolve) would use: `endpoint` if
    /// non-empty, then the configured one, then [`DEFAULT_ENDPOINT`].
    pub fn resolve_endpoint(&self, endpoint: Option<String>) -> String {
        endpoint
            .filter(|e| !e.is_empty())
            .or_else(|| self.endpoint.clone().filter(|e| !e.is_empty()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }
}

/// Retry configuration for the background scheduler
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Max retry attempts after the first failure
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for the doubling delay, in seconds
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_secs() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/focuslab/config.toml` (~/.config/focuslab/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("focuslab").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/focuslab/` (~/.local/state/focuslab/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("focuslab")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/focuslab/focuslab.log` (~/.local/state/focuslab/focuslab.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("focuslab.log")
    }
}
