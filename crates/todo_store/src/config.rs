//! Startup configuration.
//!
//! # Responsibility
//! - Describe which store backend to use and where it lives.
//! - Describe logging settings.
//!
//! # Invariants
//! - Configuration is read once at startup and treated as immutable.
//! - The `document` backend always has a non-empty endpoint.

use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_BACKEND: &str = "TODO_STORE_BACKEND";
pub const ENV_ENDPOINT: &str = "TODO_STORE_ENDPOINT";
pub const ENV_DATABASE: &str = "TODO_STORE_DATABASE";
pub const ENV_LOG_LEVEL: &str = "TODO_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TODO_LOG_DIR";
pub const ENV_ROLE_NAME: &str = "TODO_ROLE_NAME";

const DEFAULT_DATABASE_NAME: &str = "Todo";
const DEFAULT_ROLE_NAME: &str = "todo-api";

/// Backend serving the `TodoList` and `TodoItem` containers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Persistent SQLite-backed document store.
    #[default]
    Document,
    /// Process-local substitute; contents vanish on exit.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" => Ok(Self::Document),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                key: ENV_BACKEND,
                value: other.to_string(),
                reason: "expected document|memory".to_string(),
            }),
        }
    }
}

impl Display for StoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document => f.write_str("document"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory holding the database file (`document` backend only).
    #[serde(default)]
    pub endpoint: String,
    pub database_name: String,
}

impl DatabaseConfig {
    /// In-memory configuration, mostly for tests.
    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            endpoint: String::new(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
        }
    }

    pub fn document(endpoint: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::Document,
            endpoint: endpoint.into(),
            database_name: database_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservabilityConfig {
    pub level: String,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    pub role_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
            role_name: DEFAULT_ROLE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup. Blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let backend = match get(ENV_BACKEND) {
            Some(value) => value.parse()?,
            None => StoreBackend::default(),
        };
        let endpoint = get(ENV_ENDPOINT).unwrap_or_default();
        if backend == StoreBackend::Document && endpoint.is_empty() {
            return Err(ConfigError::Missing(ENV_ENDPOINT));
        }

        let level = match get(ENV_LOG_LEVEL) {
            Some(value) => normalize_level(&value)
                .map_err(|err| ConfigError::Invalid {
                    key: ENV_LOG_LEVEL,
                    value: value.clone(),
                    reason: err.to_string(),
                })?
                .to_string(),
            None => default_log_level().to_string(),
        };

        Ok(Self {
            database: DatabaseConfig {
                backend,
                endpoint,
                database_name: get(ENV_DATABASE)
                    .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
            },
            observability: ObservabilityConfig {
                level,
                log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
                role_name: get(ENV_ROLE_NAME).unwrap_or_else(|| DEFAULT_ROLE_NAME.to_string()),
            },
        })
    }
}
