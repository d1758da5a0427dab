//! Service configuration
//!
//! Configuration lives in /etc/commandd/config.toml. Every field has a
//! default, so a missing file or a partial file is fine. Environment
//! variables override the file:
//!
//! - `COMMANDD_BIND_ADDRESS`
//! - `COMMANDD_BACKEND` (`sqlite` or `memory`)
//! - `COMMANDD_CONNECTION_STRING`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// System configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/commandd";
const CONFIG_FILE: &str = "config.toml";

/// Service data directory
pub const DATA_DIR: &str = "/var/lib/commandd";

pub const ENV_BIND_ADDRESS: &str = "COMMANDD_BIND_ADDRESS";
pub const ENV_BACKEND: &str = "COMMANDD_BACKEND";
pub const ENV_CONNECTION_STRING: &str = "COMMANDD_CONNECTION_STRING";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidOverride { key: &'static str, value: String },
}

/// Which store implementation backs the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Memory => "memory",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(BackendKind::Sqlite),
            "memory" => Some(BackendKind::Memory),
            _ => None,
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Where a SQLite database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    InMemory,
}

/// Store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Path of the SQLite file, optionally prefixed with `sqlite://`.
    /// `:memory:` opens a private in-process database.
    #[serde(default = "default_connection_string")]
    pub connection_string: String,
}

fn default_connection_string() -> String {
    format!("{}/commands.db", DATA_DIR)
}

impl DatabaseConfig {
    pub fn location(&self) -> DbLocation {
        let raw = self.connection_string.trim();
        let raw = raw.strip_prefix("sqlite://").unwrap_or(raw);
        if raw == ":memory:" {
            DbLocation::InMemory
        } else {
            DbLocation::File(PathBuf::from(raw))
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            connection_string: default_connection_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandApiConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl CommandApiConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the system location and apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&config_path())?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
            self.server.bind_address = addr;
        }
        if let Some(backend) = lookup(ENV_BACKEND) {
            self.database.backend =
                BackendKind::parse(&backend).ok_or(ConfigError::InvalidOverride {
                    key: ENV_BACKEND,
                    value: backend,
                })?;
        }
        if let Some(conn) = lookup(ENV_CONNECTION_STRING) {
            self.database.connection_string = conn;
        }
        Ok(())
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    PathBuf::from(SYSTEM_CONFIG_DIR).join(CONFIG_FILE)
}
