//! Error types for the SMS parsing library.
//!
//! Two failure channels run through every parser in this crate:
//!
//! - a recoverable miss (`nom::Err::Error`), which ordered choice, optional
//!   and repetition recover from by trying something else;
//! - a rejection (`nom::Err::Failure`), raised when the input clearly has the
//!   shape of a known command but its content is wrong. Rejections carry a
//!   message meant for the sender and are never recovered by a combinator.
//!
//! The grammar registry turns both into the public [`ParseError`].

use nom::error::{ErrorKind, FromExternalError, ParseError as NomParseError};
use nom::IResult;
use thiserror::Error;

/// Convenience alias for parser results over `&str` input.
pub type PResult<'a, O> = IResult<&'a str, O, GrammarError<'a>>;

/// Why a parser stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// The input did not have the expected structure.
    Syntax(ErrorKind),
    /// The input matched structurally but was refused; the text is shown to
    /// the sender.
    Rejected(String),
}

/// Error value threaded through nom while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarError<'a> {
    /// Cursor at which the parser stopped.
    pub input: &'a str,
    /// What went wrong.
    pub reason: Reason,
}

impl<'a> GrammarError<'a> {
    /// Structural miss at `input`.
    pub fn syntax(input: &'a str, kind: ErrorKind) -> Self {
        Self {
            input,
            reason: Reason::Syntax(kind),
        }
    }

    /// Rejection at `input` with a sender-facing message.
    pub fn rejected(input: &'a str, text: impl Into<String>) -> Self {
        Self {
            input,
            reason: Reason::Rejected(text.into()),
        }
    }

    /// The rejection message, if this error is a rejection.
    pub fn rejection(&self) -> Option<&str> {
        match &self.reason {
            Reason::Rejected(text) => Some(text),
            Reason::Syntax(_) => None,
        }
    }
}

impl<'a> NomParseError<&'a str> for GrammarError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Self::syntax(input, kind)
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a, E> FromExternalError<&'a str, E> for GrammarError<'a> {
    fn from_external_error(input: &'a str, kind: ErrorKind, _e: E) -> Self {
        Self::syntax(input, kind)
    }
}

/// Recoverable miss at `input`.
#[inline]
pub fn no_match<'a, O>(input: &'a str) -> PResult<'a, O> {
    Err(nom::Err::Error(GrammarError::syntax(input, ErrorKind::Verify)))
}

/// Reject `input` with a message for the sender.
///
/// The rejection escapes every combinator and stops the grammar registry
/// from trying further models.
#[inline]
pub fn reject<'a, O>(input: &'a str, text: impl Into<String>) -> PResult<'a, O> {
    Err(nom::Err::Failure(GrammarError::rejected(input, text)))
}

/// Errors surfaced by the grammar registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No grammar matched; carries the normalised input text.
    #[error("message not understood: {0}")]
    NotUnderstood(String),

    /// A grammar matched the shape of the input but refused its content.
    #[error("{0}")]
    Rejected(String),
}

impl ParseError {
    /// Text suitable as a reply to the sender.
    pub fn text(&self) -> &str {
        match self {
            Self::NotUnderstood(text) | Self::Rejected(text) => text,
        }
    }
}

/// A regex factory refused the captured fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    /// Create a validation error with a sender-facing message.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

/// A date template could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateFormatError {
    /// A `%` directive other than `%Y %y %m %d %b %B`.
    #[error("unsupported date directive %{0}")]
    UnsupportedDirective(char),
    /// A literal other than `- , . / ` and space.
    #[error("unsupported literal {0:?} in date format")]
    UnsupportedLiteral(char),
    /// The format ends in a bare `%`.
    #[error("date format ends with a dangling %")]
    DanglingPercent,
    /// The format has no tokens.
    #[error("empty date format")]
    Empty,
}
