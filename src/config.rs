//! Configuration
//!
//! TOML file with serde defaults, plus environment variable overrides:
//! - `LEASE_LEDGER_DB`
//! - `LEASE_LEDGER_LOG_LEVEL`
//! - `LEASE_LEDGER_HOST`
//! - `LEASE_LEDGER_PORT`

use crate::backend::DEFAULT_COLLECTION_KEY;
use crate::summary::DEFAULT_CURRENCY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "LEASE_LEDGER_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the local key-value store lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_collection_key")]
    pub collection_key: String,
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("lease-ledger").join("leases.db"))
        .unwrap_or_else(|| PathBuf::from("./leases.db"))
}

fn default_collection_key() -> String {
    DEFAULT_COLLECTION_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            collection_key: default_collection_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter directive, e.g. "info" or "lease_ledger=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Resolve the config: explicit path, then `LEASE_LEDGER_CONFIG`, then the
    /// default locations, then built-in defaults. Env overrides apply last.
    ///
    /// An explicitly named file must exist and parse.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load(&path)?,
            None => Self::default_locations()
                .into_iter()
                .find(|p| p.exists())
                .map(|p| Self::load(&p))
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("lease-ledger").join("config.toml"));
        }
        paths.push(PathBuf::from("./lease-ledger.toml"));
        paths
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        if let Ok(db) = std::env::var("LEASE_LEDGER_DB") {
            self.storage.db_path = PathBuf::from(db);
        }
        if let Ok(level) = std::env::var("LEASE_LEDGER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(host) = std::env::var("LEASE_LEDGER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("LEASE_LEDGER_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Default config file content
pub fn generate_default_config() -> String {
    r#"# Lease Ledger configuration
#
# Environment variables override these settings:
# - LEASE_LEDGER_DB
# - LEASE_LEDGER_LOG_LEVEL
# - LEASE_LEDGER_HOST
# - LEASE_LEDGER_PORT

[storage]
# SQLite file acting as the local key-value store
# db_path = "/home/me/.local/share/lease-ledger/leases.db"

# Key the lease collection is stored under
collection_key = "leases"

[server]
host = "127.0.0.1"
port = 3000

[display]
currency = "ETB"

[logging]
# Any tracing EnvFilter directive
level = "info"
"#
    .to_string()
}
