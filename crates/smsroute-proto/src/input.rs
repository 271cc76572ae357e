//! Input normalisation and cursor helpers.
//!
//! A cursor is simply the unconsumed suffix of the normalised text. Parsers
//! receive a cursor by value and hand back the rest, so a failed attempt can
//! never disturb the position held by its caller.

use std::borrow::Cow;

/// Symbol standing in for an empty message.
///
/// Normalisation strips NUL from real input, so the sentinel can't collide
/// with anything a sender types.
pub const EMPTY: &str = "\0";

/// Decode raw message bytes, replacing invalid UTF-8 sequences.
pub fn decode(raw: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(raw)
}

/// Strip surrounding whitespace and NUL symbols.
pub fn normalize(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim();
    if trimmed.contains('\0') {
        Cow::Owned(trimmed.replace('\0', "").trim().to_owned())
    } else {
        Cow::Borrowed(trimmed)
    }
}

/// The text a grammar is run against: the normalised input, or [`EMPTY`].
pub fn source(normalized: &str) -> &str {
    if normalized.is_empty() {
        EMPTY
    } else {
        normalized
    }
}

/// Byte offset of `cursor` inside `source`.
///
/// `cursor` must be a suffix of `source`, which holds for every cursor a
/// parser in this crate returns.
pub fn offset(source: &str, cursor: &str) -> usize {
    source.len().saturating_sub(cursor.len())
}
