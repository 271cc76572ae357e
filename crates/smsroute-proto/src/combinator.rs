//! Combinator primitives.
//!
//! Every primitive either returns `(rest, value)` or fails without moving the
//! caller's cursor. A recoverable miss (`nom::Err::Error`) lets [`choice`],
//! [`optional`] and the repetition combinators try something else; a
//! rejection (`nom::Err::Failure`) always propagates.
//!
//! These are thin layers over nom. They exist where nom's own combinators
//! differ from the semantics the grammars rely on: repetition here is total
//! (a zero-width success ends the loop instead of erroring), [`sep`] accepts
//! separators that may match nothing, and [`choice`] works over a runtime
//! list of alternatives.

use crate::error::{GrammarError, PResult};
use crate::input::EMPTY;
use nom::bytes::complete::{tag, tag_no_case, take_while, take_while1};
use nom::character::complete::satisfy;
use nom::combinator::{eof, value};
use nom::error::ErrorKind;
use nom::sequence::{delimited, pair};
use nom::Parser;

/// Boxed parser, for lists of alternatives with different concrete types.
pub type BoxedParser<'a, O> = Box<dyn FnMut(&'a str) -> PResult<'a, O> + 'a>;

/// Box a parser so it can sit in a [`choice`] list next to other parsers.
pub fn boxed<'a, O, P>(mut parser: P) -> BoxedParser<'a, O>
where
    P: Parser<&'a str, O, GrammarError<'a>> + 'a,
{
    Box::new(move |input| parser.parse(input))
}

/// Match the next symbol if `predicate` holds for it.
pub fn satisfies<'a, F>(predicate: F) -> impl FnMut(&'a str) -> PResult<'a, char>
where
    F: Fn(char) -> bool,
{
    satisfy(predicate)
}

/// Match the next symbol if it is a member of `set`.
pub fn one_of<'a>(set: impl AsRef<str>) -> impl FnMut(&'a str) -> PResult<'a, char> {
    let set: Vec<char> = set.as_ref().chars().collect();
    satisfies(move |c| set.contains(&c))
}

/// Match the next symbol if it is not a member of `set`.
pub fn not_one_of<'a>(set: impl AsRef<str>) -> impl FnMut(&'a str) -> PResult<'a, char> {
    let set: Vec<char> = set.as_ref().chars().collect();
    satisfies(move |c| !set.contains(&c))
}

/// Zero or more applications of `parser`.
///
/// Never misses. Stops at the first miss, or at a success that consumed
/// nothing (which is not counted).
pub fn many<'a, O, P>(mut parser: P) -> impl FnMut(&'a str) -> PResult<'a, Vec<O>>
where
    P: Parser<&'a str, O, GrammarError<'a>>,
{
    move |mut input: &'a str| {
        let mut items = Vec::new();
        loop {
            match parser.parse(input) {
                Ok((rest, item)) => {
                    if rest.len() == input.len() {
                        return Ok((input, items));
                    }
                    items.push(item);
                    input = rest;
                }
                Err(nom::Err::Error(_)) => return Ok((input, items)),
                Err(e) => return Err(e),
            }
        }
    }
}

/// One or more applications of `parser`; misses exactly when there are none.
pub fn many1<'a, O, P>(parser: P) -> impl FnMut(&'a str) -> PResult<'a, Vec<O>>
where
    P: Parser<&'a str, O, GrammarError<'a>>,
{
    let mut repeated = many(parser);
    move |input: &'a str| {
        let (rest, items) = repeated(input)?;
        if items.is_empty() {
            Err(nom::Err::Error(GrammarError::syntax(input, ErrorKind::Many1)))
        } else {
            Ok((rest, items))
        }
    }
}

/// Exactly `n` applications of `parser`.
pub fn n_of<'a, O, P>(parser: P, n: usize) -> impl FnMut(&'a str) -> PResult<'a, Vec<O>>
where
    P: Parser<&'a str, O, GrammarError<'a>>,
{
    nom::multi::count(parser, n)
}

/// Ordered choice over a list of alternatives.
///
/// Each alternative starts from the same cursor, whatever earlier ones
/// consumed before missing. The first success wins.
pub fn choice<'a, O, P>(mut alternatives: Vec<P>) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    P: Parser<&'a str, O, GrammarError<'a>>,
{
    move |input: &'a str| {
        for alternative in alternatives.iter_mut() {
            match alternative.parse(input) {
                Err(nom::Err::Error(_)) => continue,
                result => return result,
            }
        }
        Err(nom::Err::Error(GrammarError::syntax(input, ErrorKind::Alt)))
    }
}

/// `parser`'s value, or `default` without consuming when it misses.
pub fn optional<'a, O, P>(mut parser: P, default: O) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    O: Clone,
    P: Parser<&'a str, O, GrammarError<'a>>,
{
    move |input: &'a str| match parser.parse(input) {
        Err(nom::Err::Error(_)) => Ok((input, default.clone())),
        result => result,
    }
}

/// One or more `parser` values separated by `separator`.
///
/// Separator values are discarded. A trailing separator that isn't followed
/// by another value is left unconsumed.
pub fn sep<'a, O, O2, P, S>(
    mut parser: P,
    mut separator: S,
) -> impl FnMut(&'a str) -> PResult<'a, Vec<O>>
where
    P: Parser<&'a str, O, GrammarError<'a>>,
    S: Parser<&'a str, O2, GrammarError<'a>>,
{
    move |input: &'a str| {
        let (mut input, first) = parser.parse(input)?;
        let mut items = vec![first];
        loop {
            let after_separator = match separator.parse(input) {
                Ok((rest, _)) => rest,
                Err(nom::Err::Error(_)) => break,
                Err(e) => return Err(e),
            };
            match parser.parse(after_separator) {
                Ok((rest, item)) => {
                    if rest.len() == input.len() {
                        break;
                    }
                    items.push(item);
                    input = rest;
                }
                Err(nom::Err::Error(_)) => break,
                Err(e) => return Err(e),
            }
        }
        Ok((input, items))
    }
}

/// Case-insensitive literal; yields the matched slice of the input.
pub fn caseless<'a>(literal: &'a str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    tag_no_case(literal)
}

/// Zero or more whitespace symbols.
pub fn whitespace(input: &str) -> PResult<'_, &str> {
    take_while(char::is_whitespace)(input)
}

/// One or more whitespace symbols.
pub fn whitespace1(input: &str) -> PResult<'_, &str> {
    take_while1(char::is_whitespace)(input)
}

/// `parser` surrounded by optional whitespace.
pub fn lexeme<'a, O, P>(parser: P) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    P: Parser<&'a str, O, GrammarError<'a>>,
{
    delimited(whitespace, parser, whitespace)
}

/// Everything left in the input. Never misses.
pub fn remaining(input: &str) -> PResult<'_, &str> {
    Ok((&input[input.len()..], input))
}

/// Match the empty-message sentinel.
pub fn empty(input: &str) -> PResult<'_, ()> {
    value((), pair(tag(EMPTY), eof))(input)
}
