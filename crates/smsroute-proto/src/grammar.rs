//! Grammar registry.
//!
//! A [`Parser`] holds an ordered table of [`Grammar`] entries, each pairing a
//! parse function with the message model it produces. Input is normalised
//! once and offered to every grammar in registration order; the first one
//! that succeeds decides the model.

use crate::error::{PResult, ParseError};
use crate::fields::Fields;
use crate::input;
use std::fmt;
use tracing::debug;

/// Signature of a grammar's parse routine.
pub type GrammarFn = for<'a> fn(&'a str) -> PResult<'a, Fields>;

/// A parse routine bound to the model it produces.
#[derive(Clone)]
pub struct Grammar<M> {
    model: M,
    parse: GrammarFn,
}

impl<M> Grammar<M> {
    /// Bind `parse` to `model`.
    pub const fn new(model: M, parse: GrammarFn) -> Self {
        Self { model, parse }
    }

    /// The model this grammar produces.
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: fmt::Debug> fmt::Debug for Grammar<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar").field("model", &self.model).finish()
    }
}

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<M> {
    /// Model of the first grammar that matched.
    pub model: M,
    /// Fields the grammar extracted.
    pub fields: Fields,
    /// Input the grammar left unconsumed.
    pub remaining: String,
}

/// Ordered set of grammars; first match wins.
#[derive(Debug, Clone)]
pub struct Parser<M> {
    grammars: Vec<Grammar<M>>,
}

impl<M: Clone + fmt::Debug> Parser<M> {
    /// Build a registry. Order of `grammars` is precedence order.
    pub fn new(grammars: impl IntoIterator<Item = Grammar<M>>) -> Self {
        Self {
            grammars: grammars.into_iter().collect(),
        }
    }

    /// Run every grammar against `text` until one matches.
    ///
    /// # Errors
    ///
    /// [`ParseError::Rejected`] as soon as a grammar rejects the input;
    /// later grammars are not tried. [`ParseError::NotUnderstood`] with the
    /// normalised text when nothing matches.
    pub fn parse(&self, text: &str) -> Result<Match<M>, ParseError> {
        let normalized = input::normalize(text);
        let source = input::source(&normalized);

        for grammar in &self.grammars {
            match (grammar.parse)(source) {
                Ok((rest, fields)) => {
                    debug!(
                        model = ?grammar.model,
                        consumed = input::offset(source, rest),
                        fields = fields.len(),
                        "grammar matched"
                    );
                    return Ok(Match {
                        model: grammar.model.clone(),
                        fields,
                        remaining: rest.to_owned(),
                    });
                }
                Err(nom::Err::Failure(e)) => {
                    let rejection = e.rejection().map(str::to_owned);
                    debug!(model = ?grammar.model, rejection = ?rejection, "grammar refused input");
                    return Err(match rejection {
                        Some(text) => ParseError::Rejected(text),
                        None => ParseError::NotUnderstood(normalized.to_string()),
                    });
                }
                Err(nom::Err::Error(_)) | Err(nom::Err::Incomplete(_)) => continue,
            }
        }

        Err(ParseError::NotUnderstood(normalized.into_owned()))
    }

    /// Registered models in precedence order.
    pub fn models(&self) -> impl Iterator<Item = &M> {
        self.grammars.iter().map(Grammar::model)
    }

    /// Number of registered grammars.
    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    /// True when no grammar is registered.
    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }
}
