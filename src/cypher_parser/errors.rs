//! Parser error type.
//!
//! Grounded on `open_cypher_parser/errors.rs`'s `OpenCypherParsingError`,
//! which implements `nom`'s `ParseError`/`ContextError` traits so `nom`'s
//! `context(...)` combinator can attach human-readable messages as parsing
//! unwinds. This crate additionally tracks line/column so the public
//! `ParseError` matches `spec.md` §4.1's contract
//! (`ParseError{line, column, message, expected_tokens}`).

use nom::error::{ContextError, ErrorKind, ParseError as NomParseError};
use std::fmt;

/// Internal error accumulated while parsing; carries a stack of
/// (remaining input, context message) pairs the way `nom`'s `context`
/// combinator expects.
#[derive(Debug, PartialEq)]
pub struct InternalParseError<'a> {
    pub errors: Vec<(&'a str, &'static str)>,
}

impl<'a> NomParseError<&'a str> for InternalParseError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        InternalParseError {
            errors: vec![(input, "unknown error")],
        }
    }

    fn append(input: &'a str, _kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, "unknown error (appended)"));
        other
    }
}

impl<'a> ContextError<&'a str> for InternalParseError<'a> {
    fn add_context(input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, ctx));
        other
    }
}

impl<'a> From<nom::error::Error<&'a str>> for InternalParseError<'a> {
    fn from(err: nom::error::Error<&'a str>) -> Self {
        InternalParseError {
            errors: vec![(err.input, "unable to parse")],
        }
    }
}

/// The public error returned by [`crate::parse`].
///
/// `line`/`column` are 1-based and point at the first byte that could not
/// be consumed. `expected_tokens` is best-effort: it is populated from the
/// innermost `context(...)` messages attached while backtracking.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub expected_tokens: Vec<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    /// Build a [`ParseError`] from the remaining-input slice the parser
    /// failed on (relative to the full source text) plus the messages
    /// collected along the backtracking path.
    pub fn from_remaining(full_source: &str, remaining: &str, context: Vec<&'static str>) -> Self {
        let (line, column) = locate(full_source, remaining);
        let message = context
            .last()
            .copied()
            .unwrap_or("failed to parse Cypher query")
            .to_string();
        ParseError {
            line,
            column,
            message,
            expected_tokens: context.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn empty_input() -> Self {
        ParseError {
            line: 1,
            column: 1,
            message: "input is empty or whitespace-only".to_string(),
            expected_tokens: vec!["a Cypher clause (MATCH, CREATE, MERGE, WITH, RETURN, ...)".to_string()],
        }
    }

    pub fn trailing_input(remaining: &str, full_source: &str) -> Self {
        let (line, column) = locate(full_source, remaining);
        ParseError {
            line,
            column,
            message: format!("unexpected trailing input: {:?}", remaining.trim()),
            expected_tokens: vec!["end of query".to_string()],
        }
    }
}

fn locate(full_source: &str, remaining: &str) -> (usize, usize) {
    let consumed = full_source.len().saturating_sub(remaining.len());
    let consumed = consumed.min(full_source.len());
    let prefix = &full_source[..consumed];
    let line = prefix.bytes().filter(|&b| b == b'\n').count() + 1;
    let column = match prefix.rfind('\n') {
        Some(pos) => consumed - pos,
        None => consumed + 1,
    };
    (line, column)
}
