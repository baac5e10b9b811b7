//! `MATCH` and `OPTIONAL MATCH`.

use nom::{character::complete::char, combinator::opt, multi::separated_list1, Parser};

use super::ast::Match;
use super::common::{keyword, required, ws, PResult};
use super::path_pattern::parse_pattern;
use super::where_clause::parse_where_clause;

pub fn parse_match_clause(input: &str) -> PResult<'_, Match<'_>> {
    let (input, optional) = opt(ws(keyword("OPTIONAL"))).parse(input)?;
    let (input, _) = ws(keyword("MATCH")).parse(input)?;
    let (input, patterns) = required(
        "one or more comma-separated patterns",
        separated_list1(ws(char(',')), parse_pattern),
    )
    .parse(input)?;
    let (input, where_) = opt(parse_where_clause).parse(input)?;
    Ok((
        input,
        Match {
            patterns,
            where_,
            optional: optional.is_some(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_match() {
        let (rest, m) = parse_match_clause("MATCH (n:Person)").unwrap();
        assert_eq!(rest, "");
        assert_eq!(m.patterns.len(), 1);
        assert!(!m.optional);
    }

    #[test]
    fn parses_optional_match() {
        let (_, m) = parse_match_clause("OPTIONAL MATCH (n)-[:LIKES]->(m)").unwrap();
        assert!(m.optional);
    }

    #[test]
    fn parses_multiple_patterns() {
        let (_, m) = parse_match_clause("MATCH (a:Person), (b:City)").unwrap();
        assert_eq!(m.patterns.len(), 2);
    }

    #[test]
    fn parses_match_with_where() {
        let (_, m) = parse_match_clause("MATCH (n:Person) WHERE n.age > 25").unwrap();
        assert!(m.where_.is_some());
    }
}
