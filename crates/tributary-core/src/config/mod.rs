//! Configuration management for Tributary.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. An explicit `--config` file, or else project-local `tributary.toml`
//! 3. User config `~/.config/tributary/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
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
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP API configuration.
    pub server: ServerConfig,

    /// Graph store configuration.
    pub store: StoreConfig,

    /// Story resolution configuration.
    pub story: StoryConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./tributary.toml` (project local)
    /// 2. `~/.config/tributary/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(LOCAL_CONFIG_FILE).exists() {
            return Self::from_file(LOCAL_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
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
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(host) = lookup("TRIBUTARY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("TRIBUTARY_PORT") {
            if let Ok(n) = port.parse() {
                self.server.port = n;
            }
        }

        // Store overrides
        if let Some(path) = lookup("TRIBUTARY_STORE_PATH") {
            self.store.path = PathBuf::from(path);
        }

        // Story overrides
        if let Some(templates) = lookup("TRIBUTARY_TEMPLATES") {
            self.story.templates = Some(PathBuf::from(templates));
        }
        if let Some(timeout) = lookup("TRIBUTARY_TIMEOUT_MS") {
            if let Ok(n) = timeout.parse() {
                self.story.request_timeout_ms = n;
            }
        }

        // Logging overrides
        if let Some(filter) = lookup("TRIBUTARY_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.story.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "story.request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.story.fan_out_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "story.fan_out_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.store.backend == StoreBackend::Memory && self.store.fixture.is_none() {
            return Err(ConfigError::Invalid(
                "store.fixture is required for the memory backend".to_string(),
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

/// HTTP API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Which graph store adapter to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SurrealDB embedded on RocksDB.
    #[default]
    Surreal,
    /// In-process graph loaded from `store.fixture`.
    Memory,
}

/// Graph store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Database directory for the surreal backend.
    pub path: PathBuf,

    /// SurrealDB namespace.
    pub namespace: String,

    /// SurrealDB database.
    pub database: String,

    /// Snapshot to load at startup. Required for the memory backend;
    /// written into the store for the surreal backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: PathBuf::from(DEFAULT_STORE_PATH),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            fixture: None,
        }
    }
}

/// Story resolution configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryConfig {
    /// Template file (TOML or YAML). If not set, uses the built-in templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<PathBuf>,

    /// Deadline for one request, in milliseconds.
    pub request_timeout_ms: u64,

    /// Parent nodes expanded concurrently per walk step.
    pub fan_out_concurrency: usize,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            templates: None, // Use built-in templates
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            fan_out_concurrency: DEFAULT_FAN_OUT_CONCURRENCY,
        }
    }
}

impl StoryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive. `RUST_LOG` takes precedence when set.
    pub filter: String,

    /// Emit JSON lines instead of human readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            json: false,
        }
    }
}
