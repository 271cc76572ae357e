//! Outbound delivery queue.
//!
//! Handlers queue notifications for other users; the dispatcher offers them
//! here once the transaction that produced them has committed. Sending is
//! best effort: a full or closed queue drops the delivery.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// A text to send to a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient: String,
    pub text: String,
}

impl Delivery {
    pub fn new(recipient: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            text: text.into(),
        }
    }
}

/// Sending half of the delivery queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<Delivery>,
}

impl Outbox {
    /// A bounded queue holding at most `capacity` deliveries.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Delivery>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Offer a delivery. Returns whether it was queued.
    pub fn enqueue(&self, recipient: impl Into<String>, text: impl Into<String>) -> bool {
        self.offer(Delivery::new(recipient, text))
    }

    pub fn offer(&self, delivery: Delivery) -> bool {
        match self.tx.try_send(delivery) {
            Ok(()) => {
                crate::metrics::record_delivery("queued");
                true
            }
            Err(TrySendError::Full(delivery)) => {
                warn!(recipient = %delivery.recipient, "Outbox full, dropping delivery");
                crate::metrics::record_delivery("full");
                false
            }
            Err(TrySendError::Closed(delivery)) => {
                debug!(recipient = %delivery.recipient, "Outbox closed, dropping delivery");
                crate::metrics::record_delivery("closed");
                false
            }
        }
    }
}
