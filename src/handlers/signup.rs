//! Health worker signup handler.
//!
//! `+vht <hmis>` (and `+hcw`, `+hcs`, `+adm`) adds the sender to a group and
//! attaches them to the facility with that HMIS code. Surveillance officers
//! already at the facility are told about the newcomer.

use super::{Context, Handler, HandlerError, HandlerResult, Response};
use crate::models::{Command, Group, User};
use async_trait::async_trait;
use tracing::debug;

pub struct HealthWorkerSignupHandler;

#[async_trait]
impl Handler for HealthWorkerSignupHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let Command::HealthWorkerSignup { group, hmis } = ctx.message.command else {
            return Err(HandlerError::unexpected("health_worker_signup", ctx.message));
        };
        let sender = ctx.message.sender.as_str();

        let Some(facility) = ctx.session.find_facility(hmis).await? else {
            return Ok(Response::new(format!(
                "No health facility found with HMIS code {hmis}."
            )));
        };

        let mut user = ctx
            .session
            .find_user(sender)
            .await?
            .unwrap_or_else(|| User::new(sender));
        user.join(group);
        let id = ctx.session.save_user(&user).await?;
        ctx.session.set_membership(id, facility.id).await?;
        debug!(
            user = id,
            groups = ?Group::held_by(user.mask).map(|g| g.code).collect::<Vec<_>>(),
            "joined facility"
        );

        let who = user.name.as_deref().unwrap_or(sender);
        let notice = format!("{who} has joined {} as {group}.", facility.name);
        let officers: Vec<User> = ctx
            .session
            .facility_members(facility.id)
            .await?
            .into_iter()
            .filter(|member| member.id != Some(id) && member.is_member(Group::HCS))
            .collect();
        debug!(facility = facility.hmis, officers = officers.len(), "notifying officers");
        for officer in officers {
            ctx.enqueue(officer.number, notice.clone());
        }

        Ok(Response::new(format!(
            "You have joined {} as {group}.",
            facility.name
        )))
    }
}
