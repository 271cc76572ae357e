//! Persistence abstraction.
//!
//! A [`Store`] hands out [`Session`]s. Everything a session does is staged
//! until [`Session::commit`]; [`Session::rollback`] (or dropping the session)
//! discards it.

use crate::db::DbError;
use crate::models::{HealthFacility, Incoming, NewFacility, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("session already finished")]
    Finished,
    #[error("message not found: {0}")]
    MessageNotFound(i64),
    #[error("user not found: {0}")]
    UserNotFound(i64),
    #[error("facility not found: {0}")]
    FacilityNotFound(i64),
    #[error("duplicate {0}")]
    Duplicate(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Db(DbError::from(err))
    }
}

/// A stored inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: i64,
    pub kind: String,
    pub sender: String,
    pub text: String,
    /// The parsed command as JSON.
    pub command: String,
    pub received_at: DateTime<Utc>,
    pub reply: Option<String>,
}

impl MessageRecord {
    /// Record for `message` under `id`, without a reply.
    pub fn pending(id: i64, message: &Incoming) -> Result<Self, StoreError> {
        Ok(Self {
            id,
            kind: message.kind().to_owned(),
            sender: message.sender.clone(),
            text: message.text.clone(),
            command: serde_json::to_string(&message.command)?,
            received_at: message.time,
            reply: None,
        })
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Open a unit of work.
    async fn session(&self) -> Result<Box<dyn Session>, StoreError>;

    /// Committed messages, oldest first.
    async fn messages(&self) -> Result<Vec<MessageRecord>, StoreError>;
}

/// One transaction against a [`Store`].
#[async_trait]
pub trait Session: Send {
    /// Record an inbound message; returns its id.
    async fn add(&mut self, message: &Incoming) -> Result<i64, StoreError>;

    async fn set_reply(&mut self, id: i64, reply: &str) -> Result<(), StoreError>;

    async fn find_user(&mut self, number: &str) -> Result<Option<User>, StoreError>;

    /// Insert (no id) or update a user; returns its id.
    async fn save_user(&mut self, user: &User) -> Result<i64, StoreError>;

    async fn find_facility(&mut self, hmis: i64) -> Result<Option<HealthFacility>, StoreError>;

    async fn add_facility(&mut self, facility: &NewFacility) -> Result<i64, StoreError>;

    /// Attach `user` to `facility`, replacing any previous membership.
    async fn set_membership(&mut self, user: i64, facility: i64) -> Result<(), StoreError>;

    /// Users attached to `facility`, by id.
    async fn facility_members(&mut self, facility: i64) -> Result<Vec<User>, StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard staged work. A no-op once the session has finished.
    async fn rollback(&mut self) -> Result<(), StoreError>;
}
