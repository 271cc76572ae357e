//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::{Backend, Config};
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("transport.name must be a URI scheme (letter, then letters, digits, '+', '-', '.'), got '{0}'")]
    InvalidTransportName(String),
    #[error("outbox.capacity must be at least 1")]
    ZeroCapacity,
    #[error("database.path is required for the sqlite backend")]
    MissingDatabasePath,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

fn is_scheme(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_scheme(&config.transport.name) {
        errors.push(ValidationError::InvalidTransportName(
            config.transport.name.clone(),
        ));
    }

    if config.outbox.capacity == 0 {
        errors.push(ValidationError::ZeroCapacity);
    }

    let db = &config.database;
    if db.backend == Backend::Sqlite {
        if db.path.is_empty() {
            errors.push(ValidationError::MissingDatabasePath);
        } else if db.path != ":memory:"
            && let Some(parent) = Path::new(&db.path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(db.path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
