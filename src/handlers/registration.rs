//! Registration handler.
//!
//! `+register <name>[, <location>]` creates the sender's user record, or
//! updates name and location when the number is already known.

use super::{Context, Handler, HandlerError, HandlerResult, Response};
use crate::models::{Command, User};
use async_trait::async_trait;
use tracing::info;

pub struct RegistrationHandler;

#[async_trait]
impl Handler for RegistrationHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let Command::Registration { name, location } = &ctx.message.command else {
            return Err(HandlerError::unexpected("registration", ctx.message));
        };
        let sender = ctx.message.sender.as_str();

        match ctx.session.find_user(sender).await? {
            None => {
                let user = User {
                    name: Some(name.clone()),
                    location: location.clone(),
                    ..User::new(sender)
                };
                let id = ctx.session.save_user(&user).await?;
                info!(user = id, "user registered");
                Ok(Response::new(format!(
                    "Welcome, {name} (#{id:04}). You have been registered."
                )))
            }
            Some(mut user) => {
                user.name = Some(name.clone());
                user.location = location.clone();
                let id = ctx.session.save_user(&user).await?;
                Ok(Response::new(format!(
                    "Hello, {name} (#{id:04}). You have updated your information."
                )))
            }
        }
    }
}
