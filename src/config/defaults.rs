//! Default value functions for configuration.

use super::types::{Backend, FrontEndKind};

pub fn default_transport_name() -> String {
    "script".to_string()
}

pub fn default_front_end() -> FrontEndKind {
    FrontEndKind::Grammar
}

pub fn default_backend() -> Backend {
    Backend::Sqlite
}

pub fn default_database_path() -> String {
    "smsroute.db".to_string()
}

pub fn default_capacity() -> usize {
    256
}
