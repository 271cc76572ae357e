//! Lexical parsers built from the combinator primitives.
//!
//! These recognise the small vocabulary of SMS commands: identifiers,
//! personal names, hash tags, durations and loosely formatted numbers.

use crate::combinator::{caseless, lexeme, many, many1, one_of, optional, sep, whitespace};
use crate::error::{no_match, GrammarError, PResult};
use chrono::TimeDelta;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, digit1};
use nom::combinator::opt;
use nom::sequence::preceded;
use nom::Parser;

const ASCII_LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";

/// A letter followed by letters, digits or underscores, containing at least
/// one digit.
///
/// Requiring a digit keeps identifiers apart from names: `abc123` is an
/// identifier, `abc` is not.
pub fn identifier(input: &str) -> PResult<'_, String> {
    identifier_with(Some(DIGITS))(input)
}

/// [`identifier`] with a configurable required set.
///
/// With `None`, any run of trailing symbols (including none) is accepted.
/// With `Some(set)`, at least one trailing symbol is required and one of them
/// must be a member of `set`.
pub fn identifier_with<'a>(
    must_contain: Option<&'a str>,
) -> impl FnMut(&'a str) -> PResult<'a, String> {
    move |input: &'a str| {
        let (rest, first) = one_of(ASCII_LETTERS)(input)?;
        let consecutive = |c: char| c.is_ascii_alphanumeric() || c == '_';
        let (rest, tail) = match must_contain {
            None => many(crate::combinator::satisfies(consecutive))(rest)?,
            Some(set) => {
                let (rest, tail) = many1(crate::combinator::satisfies(move |c| {
                    consecutive(c) || set.contains(c)
                }))(rest)?;
                if !tail.iter().any(|c| set.contains(*c)) {
                    return no_match(input);
                }
                (rest, tail)
            }
        };
        let mut ident = String::with_capacity(1 + tail.len());
        ident.push(first);
        ident.extend(tail);
        Ok((rest, ident))
    }
}

/// A run of letters.
pub fn word(input: &str) -> PResult<'_, &str> {
    take_while1(char::is_alphabetic)(input)
}

/// One or more whitespace-separated runs of letters, joined with single
/// spaces.
pub fn name(input: &str) -> PResult<'_, String> {
    let (rest, words) = sep(word, whitespace)(input)?;
    Ok((rest, words.join(" ")))
}

/// A comma with optional whitespace on either side.
pub fn separator(input: &str) -> PResult<'_, char> {
    separator_with(char(','))(input)
}

/// `parser` with optional whitespace on either side.
pub fn separator_with<'a, O, P>(parser: P) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    P: Parser<&'a str, O, GrammarError<'a>>,
{
    lexeme(parser)
}

/// A [`separator`] followed by `parser`.
pub fn next_parameter<'a, O, P>(parser: P) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    P: Parser<&'a str, O, GrammarError<'a>>,
{
    preceded(separator, parser)
}

/// Caseless match of the first listed literal; yields the literal as listed.
pub fn one_of_strings<'a>(
    literals: &'a [&'a str],
) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input: &'a str| {
        for &literal in literals {
            if let Ok((rest, _)) = caseless(literal)(input) {
                return Ok((rest, literal));
            }
        }
        no_match(input)
    }
}

/// A single tag: an optional `#` then one or more ASCII letters.
pub fn tag(input: &str) -> PResult<'_, &str> {
    preceded(opt(char('#')), take_while1(|c: char| c.is_ascii_alphabetic()))(input)
}

/// One or more tags separated by any run of spaces and commas.
pub fn tags(input: &str) -> PResult<'_, Vec<String>> {
    let (rest, found) = sep(tag, take_while1(|c: char| c == ' ' || c == ','))(input)?;
    Ok((rest, found.into_iter().map(str::to_owned).collect()))
}

/// A run of ASCII digits.
pub fn digits(input: &str) -> PResult<'_, &str> {
    digit1(input)
}

/// Loosely formatted decimal number; a comma separator becomes a dot.
///
/// Digits on both sides of the separator are optional, so `123`, `123.`
/// and `.123` all match. Input without any of the three parts is a miss.
pub fn floating(input: &str) -> PResult<'_, String> {
    let (rest, whole) = optional(digits, "")(input)?;
    let (rest, point) = optional(one_of(",.").map(Some), None)(rest)?;
    let (rest, fraction) = optional(digits, "")(rest)?;
    if whole.is_empty() && point.is_none() && fraction.is_empty() {
        return no_match(input);
    }

    let mut number = String::with_capacity(whole.len() + 1 + fraction.len());
    number.push_str(whole);
    if point.is_some() {
        number.push('.');
    }
    number.push_str(fraction);
    Ok((rest, number))
}

const UNITS: &[&str] = &["day", "week", "month", "year", "d", "w", "m", "y"];

fn days_per(unit: &str) -> i64 {
    match unit.as_bytes().first() {
        Some(b'd') => 1,
        Some(b'w') => 7,
        Some(b'm') => 30,
        _ => 365,
    }
}

/// A count and a unit, e.g. `7 days`, `1w` or `6 months`.
///
/// Months count as 30 days and years as 365. Counts that overflow are a
/// miss.
pub fn timedelta(input: &str) -> PResult<'_, TimeDelta> {
    let (rest, count) = digits(input)?;
    let (rest, _) = whitespace(rest)?;
    let (rest, unit) = one_of_strings(UNITS)(rest)?;
    let (rest, _) = opt(one_of("sS"))(rest)?;

    let days = count
        .parse::<i64>()
        .ok()
        .and_then(|count| count.checked_mul(days_per(unit)))
        .and_then(TimeDelta::try_days);
    match days {
        Some(delta) => Ok((rest, delta)),
        None => no_match(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_requires_digit() {
        assert_eq!(identifier("abc123"), Ok(("", "abc123".to_string())));
        assert!(identifier("abc").is_err());
        assert!(identifier("1abc").is_err());
        assert!(identifier("a").is_err());
    }

    #[test]
    fn test_identifier_without_requirement() {
        assert_eq!(identifier_with(None)("abc"), Ok(("", "abc".to_string())));
        assert_eq!(identifier_with(None)("a b"), Ok((" b", "a".to_string())));
    }

    #[test]
    fn test_identifier_custom_set() {
        let mut underscored = identifier_with(Some("_"));
        assert_eq!(underscored("ab_c rest"), Ok((" rest", "ab_c".to_string())));
        assert!(underscored("abc").is_err());
    }

    #[test]
    fn test_name() {
        assert_eq!(name("John"), Ok(("", "John".to_string())));
        assert_eq!(name("John Smith"), Ok(("", "John Smith".to_string())));
        assert_eq!(name("John   Smith"), Ok(("", "John Smith".to_string())));
        assert_eq!(name("John, Smith"), Ok((", Smith", "John".to_string())));
        assert!(name("42").is_err());
    }

    #[test]
    fn test_separator() {
        assert_eq!(separator(", "), Ok(("", ',')));
        assert_eq!(separator(" ,"), Ok(("", ',')));
        assert!(separator("x").is_err());
        assert_eq!(separator_with(char(';'))(" ; x"), Ok(("x", ';')));
    }

    #[test]
    fn test_next_parameter() {
        assert_eq!(
            next_parameter(name)(", Kampala"),
            Ok(("", "Kampala".to_string()))
        );
    }

    #[test]
    fn test_one_of_strings_returns_canonical() {
        let mut parser = one_of_strings(&["abc", "def"]);
        assert_eq!(parser("abc"), Ok(("", "abc")));
        assert_eq!(parser("DEF!"), Ok(("!", "def")));
        assert!(parser("ghi").is_err());
    }

    #[test]
    fn test_tags() {
        assert_eq!(tags("abc, def"), Ok(("", vec!["abc".into(), "def".into()])));
        assert_eq!(tags("#abc #def"), Ok(("", vec!["abc".into(), "def".into()])));
        assert!(tags("#").is_err());
    }

    #[test]
    fn test_floating() {
        assert_eq!(floating("123"), Ok(("", "123".to_string())));
        assert_eq!(floating("123.0"), Ok(("", "123.0".to_string())));
        assert_eq!(floating("123,0"), Ok(("", "123.0".to_string())));
        assert_eq!(floating(".123"), Ok(("", ".123".to_string())));
        assert_eq!(floating("123."), Ok(("", "123.".to_string())));
        assert!(floating("").is_err());
        assert!(floating("abc").is_err());
    }

    #[test]
    fn test_timedelta() {
        let days = |text| timedelta(text).map(|(_, delta)| delta.num_days());
        assert_eq!(days("7 days"), Ok(7));
        assert_eq!(days("7d"), Ok(7));
        assert_eq!(days("1w"), Ok(7));
        assert_eq!(days("6 months"), Ok(180));
        assert_eq!(days("1 year"), Ok(365));
        assert_eq!(days("2 Weeks"), Ok(14));
        assert!(timedelta("days").is_err());
        assert!(timedelta("7 fortnights").is_err());
    }

    #[test]
    fn test_timedelta_overflow_is_miss() {
        assert!(matches!(
            timedelta("99999999999999999999 years"),
            Err(nom::Err::Error(_))
        ));
        assert!(matches!(
            timedelta("9223372036854775807 w"),
            Err(nom::Err::Error(_))
        ));
    }
}
