//! Grammars for the supplied message models.
//!
//! Each model contributes one parse routine to the registry built by
//! [`default_parser`]. Routines extract [`Fields`]; [`Model::command`] turns
//! those into a typed [`Command`].

use crate::models::{Command, Group};
use smsroute_proto::combinator::{empty, one_of, remaining, whitespace, whitespace1};
use smsroute_proto::text::{digits, name, one_of_strings, separator, word};
use smsroute_proto::{Fields, Grammar, PResult, Parser, no_match, reject};
use thiserror::Error;

/// Message models known to the grammar registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    Empty,
    Registration,
    HealthWorkerSignup,
    NotUnderstood,
}

/// A grammar matched but left out a field its model needs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("missing field: {0}")]
    Missing(&'static str),
    #[error("unknown group code: {0}")]
    UnknownGroup(String),
}

impl Model {
    /// Build the command for this model from the fields its grammar
    /// extracted.
    pub fn command(self, fields: &Fields) -> Result<Command, FieldError> {
        match self {
            Self::Empty => Ok(Command::Empty),
            Self::NotUnderstood => Ok(Command::NotUnderstood),
            Self::Registration => {
                let name = fields.text("name").ok_or(FieldError::Missing("name"))?;
                Ok(Command::Registration {
                    name: name.to_owned(),
                    location: fields.text("location").map(str::to_owned),
                })
            }
            Self::HealthWorkerSignup => {
                let code = fields.text("group").ok_or(FieldError::Missing("group"))?;
                let group =
                    Group::by_code(code).ok_or_else(|| FieldError::UnknownGroup(code.to_owned()))?;
                let hmis = fields.integer("hmis").ok_or(FieldError::Missing("hmis"))?;
                Ok(Command::HealthWorkerSignup { group, hmis })
            }
        }
    }
}

const REGISTER_KEYWORDS: &[&str] = &["register", "reg"];
const SIGNUP_KEYWORDS: &[&str] = &["vht", "hcw", "hcs", "adm"];

const MISSING_HMIS: &str = "Must provide a health facility HMIS code (e.g. +vht 1234).";

/// Misses when a keyword runs on into a longer word (`+regular`).
fn word_end(input: &str) -> PResult<'_, ()> {
    match input.chars().next() {
        Some(c) if c.is_alphanumeric() => no_match(input),
        _ => Ok((input, ())),
    }
}

/// Empty or whitespace-only message.
pub fn parse_empty(input: &str) -> PResult<'_, Fields> {
    let (rest, ()) = empty(input)?;
    Ok((rest, Fields::new()))
}

/// `+register <name>, <location>` or `+register <word> [<location words>]`.
pub fn parse_registration(input: &str) -> PResult<'_, Fields> {
    let (rest, _) = one_of("+")(input)?;
    let (rest, _) = one_of_strings(REGISTER_KEYWORDS)(rest)?;
    let (rest, ()) = word_end(rest)?;

    let missing_name = |rest: &str| format!("Must provide a name (got: {}).", rest.trim());
    let Ok((after_space, _)) = whitespace1(rest) else {
        return reject(rest, missing_name(rest));
    };
    let Ok((after_name, full_name)) = name(after_space) else {
        return reject(after_space, missing_name(after_space));
    };

    let mut fields = Fields::new();
    match separator(after_name) {
        Ok((location, _)) => {
            fields.insert("name", full_name);
            let location = location.trim();
            if !location.is_empty() {
                fields.insert("location", location);
            }
        }
        Err(_) => {
            let (location, first) = word(after_space)?;
            fields.insert("name", first);
            let location = location.trim();
            if !location.is_empty() {
                fields.insert("location", location);
            }
        }
    }
    Ok(("", fields))
}

/// `+vht <hmis>`, `+hcw <hmis>`, `+hcs <hmis>` or `+adm <hmis>`.
pub fn parse_signup(input: &str) -> PResult<'_, Fields> {
    let (rest, _) = one_of("+")(input)?;
    let (rest, code) = one_of_strings(SIGNUP_KEYWORDS)(rest)?;
    let (rest, ()) = word_end(rest)?;
    let (rest, _) = whitespace(rest)?;

    let Ok((after, hmis)) = digits(rest) else {
        return reject(rest, MISSING_HMIS);
    };
    let Ok(hmis) = hmis.parse::<i64>() else {
        return reject(rest, MISSING_HMIS);
    };
    let (after, _) = whitespace(after)?;
    if !after.is_empty() {
        return reject(after, MISSING_HMIS);
    }

    Ok((
        after,
        Fields::new()
            .with("group", code.to_ascii_uppercase())
            .with("hmis", hmis),
    ))
}

/// Matches anything; keeps the text.
pub fn parse_anything(input: &str) -> PResult<'_, Fields> {
    let (rest, text) = remaining(input)?;
    Ok((rest, Fields::new().with("text", text)))
}

/// The registry in precedence order.
pub fn default_parser() -> Parser<Model> {
    Parser::new([
        Grammar::new(Model::Empty, parse_empty),
        Grammar::new(Model::Registration, parse_registration),
        Grammar::new(Model::HealthWorkerSignup, parse_signup),
        Grammar::new(Model::NotUnderstood, parse_anything),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use smsroute_proto::ParseError;

    fn parse(text: &str) -> Result<Command, ParseError> {
        let found = default_parser().parse(text)?;
        Ok(found.model.command(&found.fields).unwrap())
    }

    fn registration(name: &str, location: Option<&str>) -> Command {
        Command::Registration {
            name: name.into(),
            location: location.map(Into::into),
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse(""), Ok(Command::Empty));
        assert_eq!(parse("  \n"), Ok(Command::Empty));
    }

    #[test]
    fn test_registration_first_word_is_name() {
        assert_eq!(parse("+register bob user"), Ok(registration("bob", Some("user"))));
        assert_eq!(parse("+reg bob"), Ok(registration("bob", None)));
        assert_eq!(parse("+REGISTER Bob"), Ok(registration("Bob", None)));
    }

    #[test]
    fn test_registration_with_separator() {
        assert_eq!(
            parse("+register Jane Doe, Kampala Central"),
            Ok(registration("Jane Doe", Some("Kampala Central")))
        );
        assert_eq!(parse("+register Jane Doe ,"), Ok(registration("Jane Doe", None)));
    }

    #[test]
    fn test_registration_requires_name() {
        assert_eq!(
            parse("+register"),
            Err(ParseError::Rejected("Must provide a name (got: ).".into()))
        );
        assert_eq!(
            parse("+register 42"),
            Err(ParseError::Rejected("Must provide a name (got: 42).".into()))
        );
    }

    #[test]
    fn test_keyword_must_end() {
        assert_eq!(parse("+regular bob"), Ok(Command::NotUnderstood));
        assert_eq!(parse("+vhtx 12"), Ok(Command::NotUnderstood));
    }

    #[test]
    fn test_signup_groups() {
        assert_eq!(
            parse("+vht 123"),
            Ok(Command::HealthWorkerSignup {
                group: Group::VHT,
                hmis: 123
            })
        );
        assert_eq!(
            parse("+HCW 123"),
            Ok(Command::HealthWorkerSignup {
                group: Group::HCW,
                hmis: 123
            })
        );
    }

    #[test]
    fn test_signup_requires_code() {
        for text in ["+vht", "+hcs abc", "+adm 12 34", "+vht 99999999999999999999"] {
            assert_eq!(
                parse(text),
                Err(ParseError::Rejected(MISSING_HMIS.into())),
                "{text}"
            );
        }
    }

    #[test]
    fn test_anything_else() {
        assert_eq!(parse("hello there"), Ok(Command::NotUnderstood));
        let found = default_parser().parse(" hello ").unwrap();
        assert_eq!(found.fields.text("text"), Some("hello"));
    }

    #[test]
    fn test_canonical_form_reparses() {
        let commands = [
            registration("bob", None),
            registration("bob", Some("user")),
            registration("Jane Doe", None),
            registration("Jane Doe", Some("Kampala, Uganda")),
            Command::HealthWorkerSignup {
                group: Group::ADM,
                hmis: 7,
            },
            Command::Empty,
        ];
        for command in commands {
            assert_eq!(parse(&command.to_string()), Ok(command.clone()));
        }
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(
            Model::Registration.command(&Fields::new()),
            Err(FieldError::Missing("name"))
        );
        let fields = Fields::new().with("group", "XYZ").with("hmis", 1i64);
        assert_eq!(
            Model::HealthWorkerSignup.command(&fields),
            Err(FieldError::UnknownGroup("XYZ".into()))
        );
    }
}
