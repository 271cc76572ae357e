//! Domain types shared by the front ends, handlers and stores.

pub mod group;
pub mod message;
pub mod user;

pub use group::{GROUPS, Group};
pub use message::{Command, Incoming, Outgoing};
pub use user::{HealthFacility, NewFacility, User};
