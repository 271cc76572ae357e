//! Lexical parsers composed into realistic command grammars.

use chrono::NaiveDate;
use smsroute_proto::combinator::{caseless, lexeme, one_of, optional, whitespace1};
use smsroute_proto::text::{identifier, name, next_parameter, tags, timedelta};
use smsroute_proto::{
    date, reject, DateFormat, Fields, Grammar, PResult, ParseError, Parser, Value,
    DATE_INPUT_FORMATS,
};
use std::sync::OnceLock;

fn formats() -> &'static [DateFormat] {
    static FORMATS: OnceLock<Vec<DateFormat>> = OnceLock::new();
    FORMATS.get_or_init(|| DateFormat::compile_all(DATE_INPUT_FORMATS).unwrap_or_default())
}

/// `+birth <name>, <date>[, <tags>]`
fn birth(input: &str) -> PResult<'_, Fields> {
    let (rest, _) = one_of("+")(input)?;
    let (rest, _) = caseless("birth")(rest)?;
    let (rest, _) = whitespace1(rest)?;
    let (rest, child) = name(rest)?;
    let (rest, born) = match next_parameter(date(formats()))(rest) {
        Err(nom::Err::Error(_)) => return reject(rest, "Please give a date of birth."),
        other => other?,
    };
    let (rest, labels) = optional(next_parameter(tags), Vec::new())(rest)?;
    Ok((
        rest,
        Fields::new()
            .with("name", child)
            .with("born", born)
            .with("tags", labels),
    ))
}

/// `+cure <identifier> <duration>`
fn cure(input: &str) -> PResult<'_, Fields> {
    let (rest, _) = one_of("+")(input)?;
    let (rest, _) = caseless("cure")(rest)?;
    let (rest, _) = whitespace1(rest)?;
    let (rest, patient) = identifier(rest)?;
    let (rest, course) = lexeme(timedelta)(rest)?;
    Ok((
        rest,
        Fields::new().with("patient", patient).with("course", course),
    ))
}

fn parser() -> Parser<&'static str> {
    Parser::new([Grammar::new("birth", birth), Grammar::new("cure", cure)])
}

#[test]
fn test_birth_with_month_name() {
    let found = parser().parse("+BIRTH Jane Doe, 25 October 2006").unwrap();
    assert_eq!(found.model, "birth");
    assert_eq!(found.fields.text("name"), Some("Jane Doe"));
    assert_eq!(
        found.fields.date("born"),
        NaiveDate::from_ymd_opt(2006, 10, 25)
    );
    assert_eq!(found.fields.list("tags"), Some(&[][..]));
}

#[test]
fn test_birth_with_tags() {
    let found = parser()
        .parse("+birth Jane, 10/25/06, #twin #premature")
        .unwrap();
    assert_eq!(
        found.fields.get("tags"),
        Some(&Value::List(vec!["twin".into(), "premature".into()]))
    );
}

#[test]
fn test_birth_without_date_is_rejected() {
    assert_eq!(
        parser().parse("+birth Jane, yesterday"),
        Err(ParseError::Rejected("Please give a date of birth.".into()))
    );
}

#[test]
fn test_cure_duration() {
    let found = parser().parse("+cure ab12 2 weeks").unwrap();
    assert_eq!(found.model, "cure");
    assert_eq!(found.fields.text("patient"), Some("ab12"));
    assert_eq!(found.fields.duration("course").map(|d| d.num_days()), Some(14));
}

#[test]
fn test_cure_requires_identifier_with_digit() {
    assert_eq!(
        parser().parse("+cure bob 2 weeks"),
        Err(ParseError::NotUnderstood("+cure bob 2 weeks".into()))
    );
}

#[test]
fn test_trailing_text_is_remaining() {
    let found = parser().parse("+cure ab12 3d thanks").unwrap();
    assert_eq!(found.remaining, "thanks");
}
