//! `RETURN [DISTINCT] items [ORDER BY ...] [SKIP n] [LIMIT n]`.

use nom::{character::complete::char, combinator::opt, multi::separated_list1, Parser};

use super::ast::{ProjectionItem, Return};
use super::common::{keyword, parse_identifier, required, ws, PResult};
use super::expression::parse_expression;
use super::paging::{parse_limit, parse_order_by, parse_skip};

pub fn parse_return_clause(input: &str) -> PResult<'_, Return<'_>> {
    let (input, _) = ws(keyword("RETURN")).parse(input)?;
    let (input, distinct) = opt(ws(keyword("DISTINCT"))).parse(input)?;
    let (input, items) = required(
        "one or more comma-separated return items",
        separated_list1(ws(char(',')), parse_projection_item),
    )
    .parse(input)?;
    let (input, order_by) = opt(parse_order_by).parse(input)?;
    let (input, skip) = opt(parse_skip).parse(input)?;
    let (input, limit) = opt(parse_limit).parse(input)?;
    Ok((
        input,
        Return {
            distinct: distinct.is_some(),
            items,
            order_by: order_by.unwrap_or_default(),
            skip,
            limit,
        },
    ))
}

pub fn parse_projection_item(input: &str) -> PResult<'_, ProjectionItem<'_>> {
    let (input, expression) = parse_expression(input)?;
    let (input, alias) = opt(nom::sequence::preceded(
        ws(keyword("AS")),
        required("an alias after AS", parse_identifier),
    ))
    .parse(input)?;
    Ok((input, ProjectionItem { expression, alias }))
}
