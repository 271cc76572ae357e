//! Core configuration types.

use super::defaults::{
    default_backend, default_capacity, default_database_path, default_front_end,
    default_transport_name,
};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Application configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub outbox: OutboxConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// The transport messages arrive on.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// URI scheme of reply addresses (`<name>://<recipient>`).
    #[serde(default = "default_transport_name")]
    pub name: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            name: default_transport_name(),
        }
    }
}

/// Which front end turns text into commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontEndKind {
    /// Combinator grammars.
    Grammar,
    /// Regular expressions.
    Patterns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "default_front_end")]
    pub front_end: FrontEndKind,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            front_end: default_front_end(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Memory,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: Backend,
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_database_path(),
        }
    }
}

/// Outbound delivery queue.
#[derive(Debug, Clone, Deserialize)]
pub struct OutboxConfig {
    /// Deliveries held before new ones are dropped.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}
