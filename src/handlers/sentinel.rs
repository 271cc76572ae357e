//! Handlers for messages no command claimed: empty, not understood, invalid.

use super::{Context, Handler, HandlerError, HandlerResult, Response};
use crate::models::Command;
use async_trait::async_trait;
use smsroute_proto::input;

pub struct EmptyHandler;

#[async_trait]
impl Handler for EmptyHandler {
    async fn handle(&self, _ctx: &mut Context<'_>) -> HandlerResult {
        Ok(Response::new(
            "We received an empty message. Send +register <name> to register.",
        ))
    }
}

pub struct NotUnderstoodHandler;

#[async_trait]
impl Handler for NotUnderstoodHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let text = input::normalize(&ctx.message.text);
        Ok(Response::new(format!("Message not understood: \"{text}\".")))
    }
}

/// Replies with the reason the message was refused.
pub struct InvalidHandler;

#[async_trait]
impl Handler for InvalidHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        match &ctx.message.command {
            Command::Invalid { error } => Ok(Response::new(error.clone())),
            _ => Err(HandlerError::unexpected("invalid", ctx.message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::run;
    use crate::models::Incoming;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_empty_reply() {
        let store = MemoryStore::new();
        let message = Incoming::new("1", "", Command::Empty);
        let (response, deliveries) = run(&EmptyHandler, &store, &message).await;
        assert!(response.body.starts_with("We received an empty message."));
        assert!(deliveries.is_empty());
    }

    #[tokio::test]
    async fn test_not_understood_quotes_text() {
        let store = MemoryStore::new();
        let message = Incoming::new("1", "  what?\0 ", Command::NotUnderstood);
        let (response, _) = run(&NotUnderstoodHandler, &store, &message).await;
        assert_eq!(response.body, "Message not understood: \"what?\".");
    }

    #[tokio::test]
    async fn test_invalid_replies_with_error() {
        let store = MemoryStore::new();
        let command = Command::Invalid {
            error: "Must provide a name (got: ).".into(),
        };
        let message = Incoming::new("1", "+register", command);
        let (response, _) = run(&InvalidHandler, &store, &message).await;
        assert_eq!(response.body, "Must provide a name (got: ).");
    }
}
