//! Configuration system for lendmemo.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LendError, LendResult};

/// Environment variable naming a config file to load.
pub const CONFIG_PATH_ENV: &str = "LENDMEMO_CONFIG";

/// Log output format of the server binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Main service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendMemoConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// SQLite database file. `:memory:` keeps everything in RAM.
    pub database_path: PathBuf,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for LendMemoConfig {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".lendmemo"))
            .unwrap_or_else(|| PathBuf::from(".lendmemo"));

        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: data_dir.join("lendmemo.db"),
            log_format: LogFormat::Pretty,
        }
    }
}

impl LendMemoConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> LendResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| LendError::Configuration(e.to_string()))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| LendError::Configuration(e.to_string()))
            }
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| LendError::Configuration(e.to_string()))
            }
            _ => Err(LendError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> LendResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Load the file named by `LENDMEMO_CONFIG` (if set), then apply
    /// environment overrides.
    pub fn load() -> LendResult<Self> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        base.with_env_overrides()
    }

    /// Override fields from `LENDMEMO_*` environment variables.
    pub fn with_env_overrides(self) -> LendResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> LendResult<Self> {
        if let Some(host) = lookup("LENDMEMO_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("LENDMEMO_PORT") {
            self.port = port.parse().map_err(|_| {
                LendError::Configuration(format!("LENDMEMO_PORT must be a valid port number, got '{}'", port))
            })?;
        }
        if let Some(path) = lookup("LENDMEMO_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(format) = lookup("LENDMEMO_LOG_FORMAT") {
            self.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                other => {
                    return Err(LendError::Configuration(format!(
                        "LENDMEMO_LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                        other
                    )))
                }
            };
        }
        Ok(self)
    }

    /// `host:port` suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> LendMemoConfigBuilder {
        LendMemoConfigBuilder::default()
    }
}

/// Builder for LendMemoConfig.
#[derive(Default)]
pub struct LendMemoConfigBuilder {
    config: LendMemoConfig,
}

impl LendMemoConfigBuilder {
    /// Set the bind host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the bind port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the database path.
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = path.into();
        self
    }

    /// Set the log format.
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.log_format = format;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> LendMemoConfig {
        self.config
    }
}
