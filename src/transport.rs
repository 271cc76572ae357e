//! Transports: where messages enter and replies leave.
//!
//! A [`Transport`] owns the configured [`FrontEnd`] and a [`Dispatcher`].
//! Text arriving on it is parsed, dispatched, and answered with an
//! [`Outgoing`] addressed to `<name>://<sender>`.

use crate::config::{Backend, Config, DatabaseConfig, FrontEndKind};
use crate::db::{Database, DbError};
use crate::dispatch::{DispatchError, Dispatcher};
use crate::grammar::{self, Model};
use crate::handlers::Registry;
use crate::models::{Command, Incoming, Outgoing};
use crate::outbox::{Delivery, Outbox};
use crate::patterns;
use crate::store::{MemoryStore, Store};
use crate::telemetry::spans;
use chrono::Utc;
use smsroute_proto::{ParseError, Parser, PatternError, PatternParser, input};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info};

/// Errors raised while assembling a transport from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid message pattern: {0}")]
    Pattern(#[from] PatternError),
}

/// The parser that turns text into commands. Exactly one is active.
pub enum FrontEnd {
    Grammar(Parser<Model>),
    Patterns(PatternParser<Command>),
}

impl FrontEnd {
    pub fn build(kind: FrontEndKind) -> Result<Self, PatternError> {
        Ok(match kind {
            FrontEndKind::Grammar => Self::Grammar(grammar::default_parser()),
            FrontEndKind::Patterns => Self::Patterns(patterns::default_patterns()?),
        })
    }

    /// Parse `text`. Never fails: unparseable text becomes a sentinel.
    pub fn parse(&self, text: &str) -> Command {
        let command = match self {
            Self::Grammar(parser) => match parser.parse(text) {
                Ok(found) => found
                    .model
                    .command(&found.fields)
                    .unwrap_or_else(|err| Command::Invalid {
                        error: err.to_string(),
                    }),
                Err(ParseError::NotUnderstood(_)) => Command::NotUnderstood,
                Err(ParseError::Rejected(error)) => Command::Invalid { error },
            },
            Self::Patterns(parser) => parser.parse(text),
        };
        crate::metrics::record_parse(match command {
            Command::NotUnderstood => "not_understood",
            Command::Invalid { .. } => "rejected",
            _ => "matched",
        });
        command
    }
}

/// Open the store `config` names.
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>, DbError> {
    Ok(match config.backend {
        Backend::Sqlite => {
            info!(path = %config.path, "opening sqlite store");
            Arc::new(Database::new(&config.path).await?)
        }
        Backend::Memory => {
            info!("using in-memory store");
            Arc::new(MemoryStore::new())
        }
    })
}

/// A named message source.
pub struct Transport {
    name: String,
    front_end: FrontEnd,
    dispatcher: Dispatcher,
}

impl Transport {
    pub fn new(name: impl Into<String>, front_end: FrontEnd, dispatcher: Dispatcher) -> Self {
        Self {
            name: name.into(),
            front_end,
            dispatcher,
        }
    }

    /// Assemble a transport, its store and its outbox from `config`.
    ///
    /// Returns the receiving end of the outbox alongside the transport.
    pub async fn from_config(
        config: &Config,
    ) -> Result<(Self, mpsc::Receiver<Delivery>), SetupError> {
        let front_end = FrontEnd::build(config.parser.front_end)?;
        let store = open_store(&config.database).await?;
        let (outbox, rx) = Outbox::channel(config.outbox.capacity);
        let dispatcher = Dispatcher::new(store, Arc::new(Registry::new()), outbox);
        Ok((Self::new(&config.transport.name, front_end, dispatcher), rx))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address of `recipient` on this transport.
    pub fn uri(&self, recipient: &str) -> String {
        format!("{}://{}", self.name, recipient)
    }

    /// Handle a text message from `sender`.
    pub async fn incoming(&self, sender: &str, text: &str) -> Result<Incoming, DispatchError> {
        let span = spans::incoming(&self.name, sender);
        async {
            let command = self.front_end.parse(text);
            debug!(kind = command.kind(), "parsed");
            let mut message = Incoming::new(sender, text, command);
            self.dispatcher.dispatch(&mut message).await?;

            if let Some(reply) = message.reply.clone() {
                message.replies.push(Outgoing {
                    uri: self.uri(sender),
                    text: reply,
                    time: Utc::now(),
                });
            }
            Ok(message)
        }
        .instrument(span)
        .await
    }

    /// Handle a raw message body, replacing invalid UTF-8.
    pub async fn incoming_bytes(
        &self,
        sender: &str,
        raw: &[u8],
    ) -> Result<Incoming, DispatchError> {
        let text = input::decode(raw);
        self.incoming(sender, &text).await
    }
}
