//! Message handlers.
//!
//! This module contains the Handler trait and the registry the dispatcher
//! uses to route a message to the handler for its kind.
//!
//! Handlers run inside the dispatcher's transaction: everything they write
//! through [`Context::session`] commits or rolls back together with the
//! message record, and deliveries they queue are only sent after commit.

mod registration;
mod sentinel;
mod signup;

pub use self::registration::RegistrationHandler;
pub use self::sentinel::{EmptyHandler, InvalidHandler, NotUnderstoodHandler};
pub use self::signup::HealthWorkerSignupHandler;

use crate::models::Incoming;
use crate::outbox::Delivery;
use crate::store::{Session, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Handler context passed to each message handler.
pub struct Context<'a> {
    /// The open transaction.
    pub session: &'a mut dyn Session,
    /// The message being handled. Already recorded in `session`.
    pub message: &'a Incoming,
    /// Deliveries to send once the transaction commits.
    pub deliveries: &'a mut Vec<Delivery>,
}

impl Context<'_> {
    /// Queue a text for `recipient`, sent only if the transaction commits.
    pub fn enqueue(&mut self, recipient: impl Into<String>, text: impl Into<String>) {
        self.deliveries.push(Delivery::new(recipient, text));
    }
}

/// Reply produced by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub body: String,
}

impl Response {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

/// Errors that can occur during message handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{handler} handler cannot handle {kind} messages")]
    UnexpectedKind {
        handler: &'static str,
        kind: &'static str,
    },
}

impl HandlerError {
    /// Short label for metrics and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Store(_) => "store",
            Self::UnexpectedKind { .. } => "unexpected_kind",
        }
    }

    fn unexpected(handler: &'static str, message: &Incoming) -> Self {
        Self::UnexpectedKind {
            handler,
            kind: message.kind(),
        }
    }
}

/// Result type for message handlers.
pub type HandlerResult = Result<Response, HandlerError>;

/// Trait implemented by all message handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle the message in `ctx`.
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult;
}

/// `health-worker-signup` -> `health_worker_signup`
pub fn handler_name(kind: &str) -> String {
    kind.replace('-', "_")
}

/// Registry of message handlers, keyed by normalised kind.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut registry = Self::blank();
        registry.register("empty", Box::new(EmptyHandler));
        registry.register("not_understood", Box::new(NotUnderstoodHandler));
        registry.register("invalid", Box::new(InvalidHandler));
        registry.register("registration", Box::new(RegistrationHandler));
        registry.register("health_worker_signup", Box::new(HealthWorkerSignupHandler));
        registry
    }

    /// A registry with no handlers.
    pub fn blank() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` under `name`, replacing any previous one.
    pub fn register(&mut self, name: &'static str, handler: Box<dyn Handler>) {
        self.handlers.insert(name, handler);
    }

    /// Handler for message `kind`, if any.
    pub fn resolve(&self, kind: &str) -> Option<&dyn Handler> {
        self.handlers
            .get(handler_name(kind).as_str())
            .map(|handler| handler.as_ref())
    }

    /// Registered handler names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
