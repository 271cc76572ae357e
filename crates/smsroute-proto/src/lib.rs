//! # smsroute-proto
//!
//! Parsing library for loosely structured SMS commands.
//!
//! ## Features
//!
//! - Combinator primitives with full backtracking over `&str` cursors
//! - Lexical parsers for identifiers, names, tags, dates, durations and numbers
//! - An ordered grammar registry that maps text to message models
//! - A regex front end with sentinel fallbacks
//! - Two failure channels: recoverable misses and sender-facing rejections

#![deny(clippy::all)]
#![warn(missing_docs)]

//! ## Quick Start
//!
//! ```rust
//! use smsroute_proto::combinator::{caseless, one_of, remaining, whitespace1};
//! use smsroute_proto::{Fields, Grammar, PResult, Parser};
//!
//! fn greeting(input: &str) -> PResult<'_, Fields> {
//!     let (rest, _) = one_of("+")(input)?;
//!     let (rest, _) = caseless("hello")(rest)?;
//!     let (rest, _) = whitespace1(rest)?;
//!     let (rest, name) = remaining(rest)?;
//!     Ok((rest, Fields::new().with("name", name)))
//! }
//!
//! let parser = Parser::new([Grammar::new("greeting", greeting)]);
//! let found = parser.parse("+hello world").unwrap();
//! assert_eq!(found.model, "greeting");
//! assert_eq!(found.fields.text("name"), Some("world"));
//! ```

pub mod combinator;
pub mod date;
pub mod error;
pub mod fields;
pub mod grammar;
pub mod input;
pub mod pattern;
pub mod text;

pub use self::date::{date, DateFormat, DATE_INPUT_FORMATS, DEFAULT_DATE_FORMATS};
pub use self::error::{
    no_match, reject, DateFormatError, GrammarError, PResult, ParseError, Reason, ValidationError,
};
pub use self::fields::{Fields, Value};
pub use self::grammar::{Grammar, GrammarFn, Match, Parser};
pub use self::pattern::{Factory, Groups, PatternError, PatternParser, Sentinel};
