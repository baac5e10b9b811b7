//! `WHERE <expression>` — used standalone in `MATCH ... WHERE ...` and
//! reused (as a `HAVING`-bound filter once compiled) after `WITH`.

use nom::Parser;

use super::ast::Expression;
use super::common::{keyword, required, ws, PResult};
use super::expression::parse_expression;

pub fn parse_where_clause(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, _) = ws(keyword("WHERE")).parse(input)?;
    required("a boolean expression after WHERE", parse_expression).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher_parser::ast::CompareOperator;

    #[test]
    fn parses_simple_where() {
        let (rest, expr) = parse_where_clause("WHERE a = 1").unwrap();
        assert_eq!(rest, "");
        assert!(matches!(expr, Expression::Compare { op: CompareOperator::Eq, .. }));
    }
}
