//! smsroute - SMS command parsing and transactional dispatch.
//!
//! Text arrives on a [`Transport`], is parsed into a typed [`Command`] by the
//! configured front end, and is handed to the [`Dispatcher`], which records
//! it, runs its handler and commits the reply in one store transaction.

pub mod config;
pub mod db;
pub mod dispatch;
pub mod grammar;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod outbox;
pub mod patterns;
pub mod store;
pub mod telemetry;
pub mod transport;

pub use crate::config::Config;
pub use crate::dispatch::{DispatchError, Dispatcher};
pub use crate::handlers::Registry;
pub use crate::models::{Command, Group, Incoming, Outgoing};
pub use crate::outbox::{Delivery, Outbox};
pub use crate::store::{MemoryStore, Session, Store, StoreError};
pub use crate::transport::{FrontEnd, Transport};
