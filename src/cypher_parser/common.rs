//! Low-level lexical helpers shared by every clause parser.
//!
//! Grounded on `open_cypher_parser/common.rs`: the whitespace-eating `ws`
//! combinator and the identifier/numeric literal recognizers are adapted
//! from there. Comments are skipped inline by [`trivia`] rather than
//! stripped into a separate buffer first.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alphanumeric1, char, digit1},
    combinator::{cut, map, opt, recognize, value},
    error::context,
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};

use super::errors::InternalParseError;

pub type PResult<'a, O> = IResult<&'a str, O, InternalParseError<'a>>;

/// Whitespace-and-comments-eating wrapper: `trivia, inner, trivia`.
pub fn ws<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = InternalParseError<'a>>
where
    F: Parser<&'a str, Output = O, Error = InternalParseError<'a>>,
{
    delimited(trivia, inner, trivia)
}

/// Consumes runs of whitespace interleaved with `--`, `//` line comments and
/// `/* */` block comments. Never fails — an absence of trivia just consumes
/// nothing, matching `multispace0`'s behavior.
fn trivia(input: &str) -> PResult<'_, ()> {
    value((), many0(alt((multispace1_unit, line_comment, block_comment)))).parse(input)
}

fn multispace1_unit(input: &str) -> PResult<'_, &str> {
    nom::character::complete::multispace1(input)
}

fn line_comment(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        alt((tag("--"), tag("//"))),
        take_while(|c: char| c != '\n'),
    ))
    .parse(input)
}

fn block_comment(input: &str) -> PResult<'_, &str> {
    let (rest, _) = tag("/*").parse(input)?;
    match rest.find("*/") {
        Some(end) => Ok((&rest[end + 2..], &rest[..end])),
        None => Err(nom::Err::Failure(InternalParseError {
            errors: vec![(input, "unterminated block comment")],
        })),
    }
}

const RESERVED: &[&str] = &[
    "MATCH", "OPTIONAL", "WHERE", "CREATE", "MERGE", "DELETE", "DETACH", "SET", "REMOVE", "WITH",
    "RETURN", "ORDER", "BY", "SKIP", "LIMIT", "UNION", "ALL", "DISTINCT", "AS", "AND", "OR",
    "XOR", "NOT", "IN", "IS", "NULL", "STARTS", "ENDS", "CONTAINS", "TRUE", "FALSE", "CASE",
    "WHEN", "THEN", "ELSE", "END", "ON",
];

fn is_reserved(word: &str) -> bool {
    let upper = word.to_ascii_uppercase();
    RESERVED.contains(&upper.as_str())
}

fn identifier_core(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        alt((alphanumeric1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

/// A Cypher identifier: variable name, label, relationship type, or
/// property key. Keywords are rejected so e.g. `RETURN` never parses as a
/// variable reference.
pub fn parse_identifier(input: &str) -> PResult<'_, &str> {
    let (rest, ident) = identifier_core(input)?;
    if ident.chars().next().is_some_and(|c| c.is_ascii_digit()) || is_reserved(ident) {
        return Err(nom::Err::Error(InternalParseError {
            errors: vec![(input, "expected an identifier")],
        }));
    }
    Ok((rest, ident))
}

/// `$name` or positional `$0`.
pub fn parse_parameter_name(input: &str) -> PResult<'_, &str> {
    preceded(char('$'), identifier_core).parse(input)
}

fn parse_numeric_text(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        opt(char('-')),
        pair(
            alt((
                recognize(pair(digit1, pair(char('.'), digit1))),
                recognize(pair(char('.'), digit1)),
                digit1,
            )),
            opt(recognize(pair(
                alt((char('e'), char('E'))),
                pair(opt(alt((char('+'), char('-')))), digit1),
            ))),
        ),
    ))
    .parse(input)
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum NumericText {
    Int,
    Float,
}

/// Parse a numeric literal, returning the raw text and whether it should
/// be read back as an integer or a float (presence of `.` or exponent).
pub fn parse_numeric(input: &str) -> PResult<'_, (&str, NumericText)> {
    let (rest, text) = parse_numeric_text(input)?;
    let kind = if text.contains('.') || text.contains('e') || text.contains('E') {
        NumericText::Float
    } else {
        NumericText::Int
    };
    Ok((rest, (text, kind)))
}

/// A single- or double-quoted string literal. Returns the unescaped
/// contents (no surrounding quotes), only allocating when an escape
/// sequence was actually present.
pub fn parse_string_literal(input: &str) -> PResult<'_, std::borrow::Cow<'_, str>> {
    alt((quoted('\''), quoted('"'))).parse(input)
}

fn quoted<'a>(
    quote: char,
) -> impl FnMut(&'a str) -> PResult<'a, std::borrow::Cow<'a, str>> {
    move |input: &'a str| {
        let (input, _) = char(quote)(input)?;
        let mut chars = input.char_indices();
        let mut escaped = false;
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            if c == '\\' {
                escaped = true;
                chars.next();
                continue;
            }
            if c == quote {
                end = Some(i);
                break;
            }
        }
        let end = end.ok_or_else(|| {
            nom::Err::Failure(InternalParseError {
                errors: vec![(input, "unterminated string literal")],
            })
        })?;
        let raw = &input[..end];
        let rest = &input[end + 1..];
        let content = if escaped {
            std::borrow::Cow::Owned(unescape(raw, quote))
        } else {
            std::borrow::Cow::Borrowed(raw)
        };
        Ok((rest, content))
    }
}

fn unescape(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('\\') => out.push('\\'),
                Some(q) if q == quote => out.push(q),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// A non-negative integer, used for `SKIP`/`LIMIT`/variable-length bounds.
pub fn parse_unsigned(input: &str) -> PResult<'_, u32> {
    map(digit1, |s: &str| s.parse::<u32>().unwrap_or(u32::MAX)).parse(input)
}

/// Boolean literal, case-insensitive keyword.
pub fn parse_bool(input: &str) -> PResult<'_, bool> {
    alt((
        value(true, tag_no_case_owned("TRUE")),
        value(false, tag_no_case_owned("FALSE")),
    ))
    .parse(input)
}

/// `NULL` keyword.
pub fn parse_null_kw(input: &str) -> PResult<'_, ()> {
    value((), tag_no_case_owned("NULL")).parse(input)
}

/// Case-insensitive keyword match, requiring the keyword not be immediately
/// followed by another identifier character (so `ANDY` doesn't match `AND`).
pub fn keyword<'a>(
    word: &'static str,
) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input: &'a str| {
        if input.len() < word.len() {
            return Err(nom::Err::Error(InternalParseError {
                errors: vec![(input, "keyword")],
            }));
        }
        let (candidate, rest) = input.split_at(word.len());
        if !candidate.eq_ignore_ascii_case(word) {
            return Err(nom::Err::Error(InternalParseError {
                errors: vec![(input, "keyword")],
            }));
        }
        if rest
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            return Err(nom::Err::Error(InternalParseError {
                errors: vec![(input, "keyword")],
            }));
        }
        Ok((rest, candidate))
    }
}

fn tag_no_case_owned<'a>(word: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    keyword(word)
}

/// `context(...)` wrapper that converts the error variant into a `Failure`
/// so parsing doesn't silently backtrack past a clause keyword that did
/// match (mirrors the teacher's `cut`-after-keyword convention).
pub fn required<'a, O, F>(
    label: &'static str,
    inner: F,
) -> impl Parser<&'a str, Output = O, Error = InternalParseError<'a>>
where
    F: Parser<&'a str, Output = O, Error = InternalParseError<'a>>,
{
    context(label, cut(inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_rejects_keywords() {
        assert!(parse_identifier("RETURN").is_err());
        assert!(parse_identifier("match").is_err());
    }

    #[test]
    fn identifier_accepts_plain_names() {
        assert_eq!(parse_identifier("n1 "), Ok((" ", "n1")));
    }

    #[test]
    fn string_literal_single_quotes() {
        let (rest, s) = parse_string_literal("'hello'").unwrap();
        assert_eq!(rest, "");
        assert_eq!(s, "hello");
    }

    #[test]
    fn string_literal_double_quotes() {
        let (rest, s) = parse_string_literal("\"hello world\"").unwrap();
        assert_eq!(rest, "");
        assert_eq!(s, "hello world");
    }

    #[test]
    fn string_literal_escapes() {
        let (_, s) = parse_string_literal("'it\\'s here'").unwrap();
        assert_eq!(s, "it's here");
    }

    #[test]
    fn numeric_float_vs_int() {
        assert_eq!(parse_numeric("42").unwrap().1, ("42", NumericText::Int));
        assert_eq!(parse_numeric("3.14").unwrap().1, ("3.14", NumericText::Float));
        assert_eq!(parse_numeric("1e10").unwrap().1, ("1e10", NumericText::Float));
    }

    #[test]
    fn trivia_skips_line_and_block_comments_between_tokens() {
        let (rest, _) = ws(tag("MATCH")).parse("// hi\nMATCH").unwrap();
        assert_eq!(rest, "");
        let (rest, _) = ws(tag("MATCH")).parse("/* note */ MATCH").unwrap();
        assert_eq!(rest, "");
    }

    #[test]
    fn trivia_never_runs_inside_a_string_literal() {
        // `--` and `//` only start a comment between tokens; a string
        // literal is consumed whole by `parse_string_literal`, so trivia
        // never sees its interior. Regression check against a URL-shaped
        // value.
        let (rest, s) = parse_string_literal("'http://test--page'").unwrap();
        assert_eq!(rest, "");
        assert_eq!(s, "http://test--page");
    }

    #[test]
    fn keyword_rejects_prefix_match() {
        assert!(keyword("AND")("ANDY").is_err());
        assert!(keyword("AND")("AND y").is_ok());
    }
}
