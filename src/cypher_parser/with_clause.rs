//! `WITH [DISTINCT] items [WHERE ...] [ORDER BY ...] [SKIP n] [LIMIT n]`.
//!
//! `WITH` closes the current scope into a CTE (see
//! `sql_generator::projection`); its trailing `WHERE` compiles as `HAVING`
//! when the projection aggregates (`spec.md` §4.3.4).

use nom::{character::complete::char, combinator::opt, multi::separated_list1, Parser};

use super::ast::With;
use super::common::{keyword, required, ws, PResult};
use super::paging::{parse_limit, parse_order_by, parse_skip};
use super::return_clause::parse_projection_item;
use super::where_clause::parse_where_clause;

pub fn parse_with_clause(input: &str) -> PResult<'_, With<'_>> {
    let (input, _) = ws(keyword("WITH")).parse(input)?;
    let (input, distinct) = opt(ws(keyword("DISTINCT"))).parse(input)?;
    let (input, items) = required(
        "one or more comma-separated WITH items",
        separated_list1(ws(char(',')), parse_projection_item),
    )
    .parse(input)?;
    let (input, where_) = opt(parse_where_clause).parse(input)?;
    let (input, order_by) = opt(parse_order_by).parse(input)?;
    let (input, skip) = opt(parse_skip).parse(input)?;
    let (input, limit) = opt(parse_limit).parse(input)?;
    Ok((
        input,
        With {
            distinct: distinct.is_some(),
            items,
            where_,
            order_by: order_by.unwrap_or_default(),
            skip,
            limit,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_where() {
        let (rest, w) = parse_with_clause(
            "WITH c.name AS city, COUNT(p) AS population WHERE population > 1000",
        )
        .unwrap();
        assert_eq!(rest, "");
        assert_eq!(w.items.len(), 2);
        assert!(w.where_.is_some());
    }
}
