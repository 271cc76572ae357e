//! Configuration loading and management.
//!
//! - [`types`]: config structs and [`Config::load`]
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks

pub mod defaults;
mod types;
pub mod validation;

pub use types::{
    Backend, Config, ConfigError, DatabaseConfig, FrontEndKind, OutboxConfig, ParserConfig,
    TransportConfig,
};
pub use validation::{ValidationError, validate};
