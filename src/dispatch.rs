//! Transactional dispatch.
//!
//! One message, one transaction: the message is recorded, handled and
//! answered inside a single [`Session`](crate::store::Session). Either all of
//! it commits or none of it does, and the message's reply is only set after
//! a successful commit.

use crate::handlers::{Context, HandlerError, Registry};
use crate::models::Incoming;
use crate::outbox::{Delivery, Outbox};
use crate::store::{Store, StoreError};
use crate::telemetry::{DispatchTimer, spans};
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, debug, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to open session: {0}")]
    Session(#[source] StoreError),
    #[error("failed to record message: {0}")]
    Record(#[source] StoreError),
    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
    #[error("failed to commit: {0}")]
    Commit(#[source] StoreError),
}

impl DispatchError {
    /// Stage label for metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::Record(_) => "record",
            Self::Handler(_) => "handler",
            Self::Commit(_) => "commit",
        }
    }
}

/// Reply for kinds with no registered handler.
pub fn no_handler_reply(kind: &str) -> String {
    format!("No handler available for message kind ``{kind}``.")
}

/// Routes messages to handlers inside one transaction each.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn Store>,
    registry: Arc<Registry>,
    outbox: Outbox,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn Store>, registry: Arc<Registry>, outbox: Outbox) -> Self {
        Self {
            store,
            registry,
            outbox,
        }
    }

    /// Record, handle and answer `message`.
    ///
    /// On success `message.id` and `message.reply` are set and queued
    /// deliveries have been offered to the outbox. On error the transaction
    /// has been rolled back, `message` is unchanged and nothing was sent.
    pub async fn dispatch(&self, message: &mut Incoming) -> Result<(), DispatchError> {
        let kind = message.kind();
        let span = spans::dispatch(kind, &message.sender);
        let mut timer = DispatchTimer::new(kind);

        let result = self.transact(message).instrument(span.clone()).await;
        let _enter = span.enter();
        match result {
            Ok((id, reply, deliveries)) => {
                message.id = Some(id);
                message.reply = Some(reply);
                let queued = deliveries
                    .into_iter()
                    .map(|delivery| self.outbox.offer(delivery))
                    .filter(|&queued| queued)
                    .count();
                debug!(id, queued, "message dispatched");
                Ok(())
            }
            Err(err) => {
                if let DispatchError::Handler(e) = &err {
                    debug!(code = e.error_code(), "handler failed");
                }
                timer.fail(err.stage());
                warn!(error = %err, stage = err.stage(), "dispatch rolled back");
                Err(err)
            }
        }
    }

    async fn transact(
        &self,
        message: &Incoming,
    ) -> Result<(i64, String, Vec<Delivery>), DispatchError> {
        let mut session = self.store.session().await.map_err(DispatchError::Session)?;

        let staged: Result<_, DispatchError> = async {
            let id = session.add(message).await.map_err(DispatchError::Record)?;

            let mut deliveries = Vec::new();
            let reply = match self.registry.resolve(message.kind()) {
                Some(handler) => {
                    let mut ctx = Context {
                        session: session.as_mut(),
                        message,
                        deliveries: &mut deliveries,
                    };
                    handler.handle(&mut ctx).await?.body
                }
                None => {
                    debug!(kind = message.kind(), "no handler registered");
                    no_handler_reply(message.kind())
                }
            };

            session
                .set_reply(id, &reply)
                .await
                .map_err(DispatchError::Record)?;
            session.commit().await.map_err(DispatchError::Commit)?;
            Ok((id, reply, deliveries))
        }
        .await;

        if staged.is_err()
            && let Err(err) = session.rollback().await
        {
            warn!(error = %err, "rollback failed");
        }
        staged
    }
}
