//! Configuration management for Decor.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `decor.toml` file
//! 3. User config `~/.config/decor/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Variant default timeouts and polling.
    pub execution: ExecutionConfig,

    /// OS service control commands.
    pub service: ServiceConfig,

    /// Table reset/load client commands.
    pub data: DataConfig,

    /// Script runner command.
    pub batch: BatchConfig,

    /// ETL runner command.
    pub etl: EtlConfig,

    /// Log output.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./decor.toml` (project local)
    /// 2. `~/.config/decor/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_file(DEFAULT_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(DEFAULT_CONFIG_DIR).join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(ms) = std::env::var("DECOR_SERVICE_TIMEOUT_MS") {
            if let Ok(n) = ms.parse() {
                self.execution.service_timeout_ms = n;
            }
        }
        if let Ok(ms) = std::env::var("DECOR_PROCESS_TIMEOUT_MS") {
            if let Ok(n) = ms.parse() {
                self.execution.process_timeout_ms = n;
            }
        }

        if let Ok(level) = std::env::var("DECOR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("DECOR_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => self.logging.format = LogFormat::Json,
                "pretty" => self.logging.format = LogFormat::Pretty,
                _ => {}
            }
        }
    }

    /// Reject values no executor can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.service_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "execution.service_poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.service.start.is_empty() || self.service.stop.is_empty() {
            return Err(ConfigError::Invalid(
                "service.start and service.stop must name a program".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Variant defaults used by the defaults resolver and executors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Service start/stop timeout when none is declared (ms).
    pub service_timeout_ms: u64,

    /// Process run timeout when none is declared (ms, 0 = do not wait).
    pub process_timeout_ms: u64,

    /// Interval between service status polls (ms).
    pub service_poll_interval_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            service_timeout_ms: DEFAULT_SERVICE_TIMEOUT_MS,
            process_timeout_ms: DEFAULT_PROCESS_TIMEOUT_MS,
            service_poll_interval_ms: DEFAULT_SERVICE_POLL_INTERVAL_MS,
        }
    }
}

/// OS service control. Arguments may use the `{service}` placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub start: Vec<String>,
    pub stop: Vec<String>,
    /// Exits 0 while the service is running.
    pub status: Vec<String>,
    /// Text the status output must contain while running (empty: exit code only).
    pub running_marker: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            start: to_strings(DEFAULT_SERVICE_START),
            stop: to_strings(DEFAULT_SERVICE_STOP),
            status: to_strings(DEFAULT_SERVICE_STATUS),
            running_marker: DEFAULT_SERVICE_RUNNING_MARKER.to_string(),
        }
    }
}

/// Table client commands. Placeholders: `{connection}`, `{table}`, `{file}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub reset: Vec<String>,
    pub load: Vec<String>,
}

/// Script runner. Placeholders: `{connection}`, `{file}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub run: Vec<String>,
}

/// ETL runner. Placeholders: `{server}`, `{path}`, `{name}`, `{connection}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub run: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`.
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::default(),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.execution.service_timeout_ms, DEFAULT_SERVICE_TIMEOUT_MS);
        assert_eq!(config.execution.process_timeout_ms, 0);
        assert!(config.data.reset.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_to_toml() {
        let toml_str = Config::default_config_string();
        assert!(toml_str.contains("[execution]"));
        assert!(toml_str.contains("[service]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_zero_poll_interval_is_invalid() {
        let mut config = Config::default();
        config.execution.service_poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
