//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/benchdesk/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/benchdesk/` (~/.config/benchdesk/)
//! - Data: `$XDG_DATA_HOME/benchdesk/` (~/.local/share/benchdesk/)
//! - State/Logs: `$XDG_STATE_HOME/benchdesk/` (~/.local/state/benchdesk/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

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

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
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
    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Run service configuration
    #[serde(default)]
    pub runs: RunServiceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Document store configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct StoreConfig {
    /// Root directory holding the collection directories.
    /// Defaults to `$XDG_DATA_HOME/benchdesk/documents`.
    pub root: Option<PathBuf>,
}

/// Run service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RunServiceConfig {
    /// Benchmark server URL (e.g., `http://localhost:8080`)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Milliseconds between status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_run_timeout")]
    pub timeout_secs: u64,
}

impl Default for RunServiceConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_run_timeout(),
        }
    }
}

impl RunServiceConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(Error::Config("runs.server_url must not be empty".to_string()));
        }
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "runs.server_url must be an http(s) URL, got {}",
                self.server_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config(
                "runs.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_run_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
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
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.runs.validate()?;
        Ok(config)
    }

    /// Resolved document store root
    pub fn store_root(&self) -> PathBuf {
        self.store
            .root
            .clone()
            .unwrap_or_else(Self::default_store_root)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/benchdesk/config.toml` (~/.config/benchdesk/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("benchdesk").join("config.toml")
    }

    /// Returns the data directory path
    ///
    /// `$XDG_DATA_HOME/benchdesk/` (~/.local/share/benchdesk/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("benchdesk")
    }

    /// Returns the state directory path
    ///
    /// `$XDG_STATE_HOME/benchdesk/` (~/.local/state/benchdesk/), where the
    /// daily log files live.
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("benchdesk")
    }

    /// Returns the default document store root
    ///
    /// `$XDG_DATA_HOME/benchdesk/documents` (~/.local/share/benchdesk/documents)
    pub fn default_store_root() -> PathBuf {
        Self::data_dir().join("documents")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
