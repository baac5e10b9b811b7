//! `[DETACH] DELETE expr (, expr)*`.

use nom::{character::complete::char, combinator::opt, multi::separated_list1, Parser};

use super::ast::Delete;
use super::common::{keyword, required, ws, PResult};
use super::expression::parse_expression;

pub fn parse_delete_clause(input: &str) -> PResult<'_, Delete<'_>> {
    let (input, detach) = opt(ws(keyword("DETACH"))).parse(input)?;
    let (input, _) = ws(keyword("DELETE")).parse(input)?;
    let (input, items) = required(
        "one or more comma-separated expressions",
        separated_list1(ws(char(',')), parse_expression),
    )
    .parse(input)?;
    Ok((
        input,
        Delete {
            detach: detach.is_some(),
            items,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delete() {
        let (rest, d) = parse_delete_clause("DELETE n").unwrap();
        assert_eq!(rest, "");
        assert!(!d.detach);
    }

    #[test]
    fn parses_detach_delete() {
        let (_, d) = parse_delete_clause("DETACH DELETE n").unwrap();
        assert!(d.detach);
    }
}
