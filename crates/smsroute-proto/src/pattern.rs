//! Regex front end.
//!
//! An alternative to the grammar registry: an ordered list of
//! case-insensitive regular expressions, each bound to a factory that turns
//! the named captures into a message. Unlike the grammar registry this never
//! fails; unmatched input and refused captures come back as sentinel
//! messages.

use crate::error::ValidationError;
use crate::input;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use tracing::debug;

pub use regex::Error as PatternError;

/// Named capture groups that took part in a match.
pub type Groups = HashMap<String, String>;

/// Builds a message from the matched text and its named captures.
pub type Factory<T> = fn(&str, &Groups) -> Result<T, ValidationError>;

/// Messages a [`PatternParser`] falls back to.
pub trait Sentinel: Sized {
    /// No pattern matched `text`.
    fn not_understood(text: &str) -> Self;

    /// A pattern matched `text` but its factory refused the captures.
    fn invalid(text: &str, error: ValidationError) -> Self;
}

struct Pattern<T> {
    regex: Regex,
    factory: Factory<T>,
}

/// Ordered regex patterns; first structural match wins.
pub struct PatternParser<T> {
    patterns: Vec<Pattern<T>>,
}

impl<T: Sentinel> PatternParser<T> {
    /// Compile `patterns` case-insensitively, keeping their order. `.` also
    /// matches line breaks, so multi-line messages match as a whole.
    pub fn new<'p>(
        patterns: impl IntoIterator<Item = (&'p str, Factory<T>)>,
    ) -> Result<Self, PatternError> {
        let patterns = patterns
            .into_iter()
            .map(|(pattern, factory)| {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .dot_matches_new_line(true)
                    .build()?;
                Ok(Pattern { regex, factory })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;
        Ok(Self { patterns })
    }

    /// Turn `text` into a message.
    ///
    /// The text is normalised the way the grammar registry normalises it.
    /// The first pattern that matches decides; its factory sees only the
    /// named groups that participated in the match.
    pub fn parse(&self, text: &str) -> T {
        let normalized = input::normalize(text);
        let text: &str = &normalized;

        for pattern in &self.patterns {
            let Some(captures) = pattern.regex.captures(text) else {
                continue;
            };
            let groups: Groups = pattern
                .regex
                .capture_names()
                .flatten()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.to_owned(), m.as_str().to_owned()))
                })
                .collect();

            debug!(pattern = pattern.regex.as_str(), "pattern matched");
            return match (pattern.factory)(text, &groups) {
                Ok(message) => message,
                Err(error) => {
                    debug!(%error, "pattern factory refused captures");
                    T::invalid(text, error)
                }
            };
        }

        T::not_understood(text)
    }

    /// The compiled patterns, in order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.regex.as_str())
    }
}
