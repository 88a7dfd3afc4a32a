use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::SessionConfig;

/// Environment variable that overrides the config file location.
const CONFIG_PATH_ENV: &str = "PTYSCRIPT_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl SessionConfig {
    /// Returns the path to the configuration file.
    ///
    /// `$PTYSCRIPT_CONFIG` wins when set. Otherwise uses
    /// `~/.config/ptyscript/session.toml` on Unix, or the platform
    /// equivalent via `dirs::config_dir()`, falling back to the
    /// current directory.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("ptyscript").join("session.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file yields `SessionConfig::default()`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(SessionConfig::default());
        }
        Self::load_from(&path)
    }

    /// Loads and validates configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: SessionConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - Terminal geometry is non-zero
    /// - Read buffer and event queue can hold at least one chunk
    /// - Polling slices are non-zero, so waits make progress
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "terminal geometry must be non-zero, got {}x{}",
                    self.rows, self.cols
                ),
            });
        }
        if self.read_buffer_size == 0 {
            return Err(ConfigError::ValidationError {
                message: "read_buffer_size must be > 0".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ValidationError {
                message: "event_capacity must be > 0".to_string(),
            });
        }
        if self.poll_interval_ms == 0 || self.idle_poll_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "poll_interval_ms and idle_poll_ms must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
