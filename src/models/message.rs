//! Inbound and outbound messages.

use super::group::Group;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smsroute_proto::{Sentinel, ValidationError};
use std::fmt;

/// What a message asks for, with the fields its grammar extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Command {
    /// The message had no text.
    Empty,
    /// No grammar recognised the text.
    NotUnderstood,
    /// A grammar recognised the command but refused its content.
    Invalid { error: String },
    /// `+register <name>[, <location>]`
    Registration {
        name: String,
        location: Option<String>,
    },
    /// `+vht <hmis>` and friends.
    HealthWorkerSignup { group: Group, hmis: i64 },
}

impl Command {
    /// Kind discriminator, e.g. `health-worker-signup`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::NotUnderstood => "not-understood",
            Self::Invalid { .. } => "invalid",
            Self::Registration { .. } => "registration",
            Self::HealthWorkerSignup { .. } => "health-worker-signup",
        }
    }
}

/// Canonical SMS form. Parsing it yields the same command, except for the
/// two sentinels which have no SMS form of their own.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::NotUnderstood => f.write_str("<not understood>"),
            Self::Invalid { error } => write!(f, "<invalid: {error}>"),
            Self::Registration {
                name,
                location: Some(location),
            } => write!(f, "+register {name}, {location}"),
            Self::Registration {
                name,
                location: None,
            } if name.contains(char::is_whitespace) => write!(f, "+register {name},"),
            Self::Registration { name, location: None } => write!(f, "+register {name}"),
            Self::HealthWorkerSignup { group, hmis } => {
                write!(f, "+{} {hmis}", group.code.to_ascii_lowercase())
            }
        }
    }
}

impl Sentinel for Command {
    fn not_understood(_text: &str) -> Self {
        Self::NotUnderstood
    }

    fn invalid(_text: &str, error: ValidationError) -> Self {
        Self::Invalid { error: error.0 }
    }
}

/// A reply recorded against an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outgoing {
    /// `<transport>://<recipient>`
    pub uri: String,
    pub text: String,
    pub time: DateTime<Utc>,
}

/// An inbound message and everything that happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Incoming {
    /// Store id, known once the dispatcher has committed the message.
    pub id: Option<i64>,
    pub sender: String,
    /// Text as received.
    pub text: String,
    pub time: DateTime<Utc>,
    pub command: Command,
    /// Set exactly once, after the dispatcher commits.
    pub reply: Option<String>,
    pub replies: Vec<Outgoing>,
}

impl Incoming {
    pub fn new(sender: impl Into<String>, text: impl Into<String>, command: Command) -> Self {
        Self {
            id: None,
            sender: sender.into(),
            text: text.into(),
            time: Utc::now(),
            command,
            reply: None,
            replies: Vec::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.command.kind()
    }
}
