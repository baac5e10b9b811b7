//! Entry point for turning Cypher source text into a [`CypherAst`].
//!
//! The grammar this module drives is `spec.md` §3's "ordered list of
//! top-level clauses": zero or more reading/updating clauses
//! (`MATCH`/`CREATE`/`MERGE`/`DELETE`/`SET`/`REMOVE`), each optionally
//! followed by `WITH` (which can itself be followed by more reading/updating
//! clauses), ending in an optional terminal `RETURN`. A whole query may be
//! repeated with `UNION`/`UNION ALL` in between.

pub mod ast;
pub mod common;
pub mod create_clause;
pub mod delete_clause;
pub mod errors;
pub mod expression;
pub mod match_clause;
pub mod merge_clause;
pub mod path_pattern;
pub mod paging;
pub mod remove_clause;
pub mod return_clause;
pub mod set_clause;
pub mod where_clause;
pub mod with_clause;

use nom::{branch::alt, combinator::opt, multi::many0, Parser};

use ast::{Clause, CypherAst, Query, UnionType};
use common::{keyword, required, ws, PResult};
use errors::ParseError;

/// Parse a single Cypher statement (optionally a `UNION`/`UNION ALL` chain
/// of query bodies) into a [`CypherAst`].
///
/// Every returned node borrows directly from `cypher`; comments are skipped
/// inline by [`common::ws`] rather than stripped into a separate buffer, so
/// `line`/`column` positions in a [`ParseError`] always refer to the
/// caller's original text.
pub fn parse(cypher: &str) -> Result<CypherAst<'_>, ParseError> {
    if cypher.trim().is_empty() {
        return Err(ParseError::empty_input());
    }

    match parse_cypher_ast(cypher) {
        Ok((rest, ast)) => {
            if rest.trim().is_empty() {
                Ok(ast)
            } else {
                Err(ParseError::trailing_input(rest, cypher))
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let (remaining, context) = worst_failure(e);
            Err(ParseError::from_remaining(cypher, remaining, context))
        }
        Err(nom::Err::Incomplete(_)) => Err(ParseError::trailing_input(cypher, cypher)),
    }
}

/// `nom`'s `context` stack accumulates shallow-to-deep; the deepest
/// (shortest remaining input) entry is the most specific failure point.
fn worst_failure(e: errors::InternalParseError<'_>) -> (&str, Vec<&'static str>) {
    let remaining = e
        .errors
        .iter()
        .map(|(rest, _)| *rest)
        .min_by_key(|rest| rest.len())
        .unwrap_or("");
    let context = e.errors.into_iter().map(|(_, ctx)| ctx).collect();
    (remaining, context)
}

fn parse_cypher_ast(input: &str) -> PResult<'_, CypherAst<'_>> {
    let (input, first) = parse_query(input)?;
    let (input, rest) = many0(parse_union_branch).parse(input)?;
    Ok((input, CypherAst { first, rest }))
}

fn parse_union_branch(input: &str) -> PResult<'_, (UnionType, Query<'_>)> {
    let (input, _) = ws(keyword("UNION")).parse(input)?;
    let (input, all) = opt(ws(keyword("ALL"))).parse(input)?;
    let union_type = if all.is_some() { UnionType::All } else { UnionType::Distinct };
    let (input, query) = required("a query after UNION", parse_query).parse(input)?;
    Ok((input, (union_type, query)))
}

fn parse_query(input: &str) -> PResult<'_, Query<'_>> {
    let (input, clauses) = many0(parse_clause).parse(input)?;
    Ok((input, Query { clauses }))
}

fn parse_clause(input: &str) -> PResult<'_, Clause<'_>> {
    alt((
        |i| match_clause::parse_match_clause(i).map(|(r, c)| (r, Clause::Match(c))),
        |i| create_clause::parse_create_clause(i).map(|(r, c)| (r, Clause::Create(c))),
        |i| merge_clause::parse_merge_clause(i).map(|(r, c)| (r, Clause::Merge(c))),
        |i| delete_clause::parse_delete_clause(i).map(|(r, c)| (r, Clause::Delete(c))),
        |i| set_clause::parse_set_clause(i).map(|(r, c)| (r, Clause::Set(c))),
        |i| remove_clause::parse_remove_clause(i).map(|(r, c)| (r, Clause::Remove(c))),
        |i| with_clause::parse_with_clause(i).map(|(r, c)| (r, Clause::With(c))),
        |i| return_clause::parse_return_clause(i).map(|(r, c)| (r, Clause::Return(c))),
    ))
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_input() {
        assert!(parse("").is_err());
        assert!(parse("   \n  ").is_err());
    }

    #[test]
    fn parses_simple_match_return() {
        let ast = parse("MATCH (n:Person) RETURN n.name").unwrap();
        assert!(!ast.is_union());
        assert_eq!(ast.first.clauses.len(), 2);
    }

    #[test]
    fn parses_match_with_return() {
        let ast = parse(
            "MATCH (n:Person)-[:KNOWS]->(m:Person) WITH n, count(m) AS friends WHERE friends > 1 RETURN n.name, friends ORDER BY friends DESC LIMIT 10",
        )
        .unwrap();
        assert_eq!(ast.first.clauses.len(), 3);
    }

    #[test]
    fn parses_union_all() {
        let ast = parse("MATCH (n:Person) RETURN n.name UNION ALL MATCH (n:Company) RETURN n.name").unwrap();
        assert!(ast.is_union());
        assert_eq!(ast.rest.len(), 1);
        assert_eq!(ast.rest[0].0, UnionType::All);
    }

    #[test]
    fn parses_union_distinct() {
        let ast = parse("MATCH (n:Person) RETURN n.name UNION MATCH (n:Company) RETURN n.name").unwrap();
        assert_eq!(ast.rest[0].0, UnionType::Distinct);
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse("MATCH (n) RETURN n ;;; garbage").unwrap_err();
        assert_eq!(err.message.contains("trailing"), true);
    }

    #[test]
    fn parses_create_merge_delete() {
        let ast = parse("CREATE (n:Person {name: 'Alice'})").unwrap();
        assert_eq!(ast.first.clauses.len(), 1);

        let ast = parse("MERGE (n:Person {id: 1}) ON CREATE SET n.created = true").unwrap();
        assert_eq!(ast.first.clauses.len(), 1);

        let ast = parse("MATCH (n:Person {id: 1}) DETACH DELETE n").unwrap();
        assert_eq!(ast.first.clauses.len(), 2);
    }

    #[test]
    fn reports_line_and_column_on_failure() {
        let err = parse("MATCH (n:Person)\nRETURN n.").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
