//! Regex front end for the supplied message models.

use crate::models::{Command, Group};
use smsroute_proto::{Factory, Groups, PatternError, PatternParser, ValidationError};

const REGISTRATION: &str = r"^\+reg(?:ister)?\b\s*(?P<args>.*)$";
const SIGNUP: &str = r"^\+(?P<group>vht|hcw|hcs|adm)\b\s*(?P<hmis>.*)$";

fn empty(_text: &str, _groups: &Groups) -> Result<Command, ValidationError> {
    Ok(Command::Empty)
}

fn is_name(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .split_whitespace()
            .all(|word| word.chars().all(char::is_alphabetic))
}

fn registration(_text: &str, groups: &Groups) -> Result<Command, ValidationError> {
    let args = groups.get("args").map(|s| s.trim()).unwrap_or_default();
    let (name, location) = match args.split_once(',') {
        Some((name, location)) => (name.trim(), location.trim()),
        None => match args.split_once(char::is_whitespace) {
            Some((name, location)) => (name, location.trim()),
            None => (args, ""),
        },
    };

    if !is_name(name) {
        return Err(ValidationError::new(format!(
            "Must provide a name (got: {args})."
        )));
    }
    Ok(Command::Registration {
        name: name.split_whitespace().collect::<Vec<_>>().join(" "),
        location: (!location.is_empty()).then(|| location.to_owned()),
    })
}

fn signup(_text: &str, groups: &Groups) -> Result<Command, ValidationError> {
    let group = groups
        .get("group")
        .and_then(|code| Group::by_code(code))
        .ok_or_else(|| ValidationError::new("Unknown group."))?;
    let hmis = groups
        .get("hmis")
        .map(|code| code.trim())
        .filter(|code| !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|code| code.parse::<i64>().ok())
        .ok_or_else(|| {
            ValidationError::new("Must provide a health facility HMIS code (e.g. +vht 1234).")
        })?;
    Ok(Command::HealthWorkerSignup { group, hmis })
}

/// The pattern list in precedence order.
pub fn default_patterns() -> Result<PatternParser<Command>, PatternError> {
    PatternParser::new([
        (r"^$", empty as Factory<Command>),
        (REGISTRATION, registration as Factory<Command>),
        (SIGNUP, signup as Factory<Command>),
    ])
}
