//! `ORDER BY`, `SKIP`, `LIMIT` — shared by `RETURN` and `WITH`.

use nom::{combinator::opt, multi::separated_list1, sequence::preceded, Parser};

use super::ast::OrderByItem;
use super::common::{keyword, parse_unsigned, required, ws, PResult};
use super::expression::parse_expression;

pub fn parse_order_by(input: &str) -> PResult<'_, Vec<OrderByItem<'_>>> {
    let (input, _) = ws(keyword("ORDER")).parse(input)?;
    let (input, _) = required("BY", ws(keyword("BY"))).parse(input)?;
    required(
        "one or more comma-separated order-by expressions",
        separated_list1(ws(nom::character::complete::char(',')), parse_order_by_item),
    )
    .parse(input)
}

fn parse_order_by_item(input: &str) -> PResult<'_, OrderByItem<'_>> {
    let (input, expression) = parse_expression(input)?;
    let (input, desc) = opt(nom::branch::alt((
        nom::combinator::value(true, ws(keyword("DESC"))),
        nom::combinator::value(true, ws(keyword("DESCENDING"))),
        nom::combinator::value(false, ws(keyword("ASC"))),
        nom::combinator::value(false, ws(keyword("ASCENDING"))),
    )))
    .parse(input)?;
    Ok((
        input,
        OrderByItem {
            expression,
            descending: desc.unwrap_or(false),
        },
    ))
}

pub fn parse_skip(input: &str) -> PResult<'_, i64> {
    preceded(ws(keyword("SKIP")), required("an integer after SKIP", ws(parse_unsigned)))
        .map(|n| n as i64)
        .parse(input)
}

pub fn parse_limit(input: &str) -> PResult<'_, i64> {
    preceded(ws(keyword("LIMIT")), required("an integer after LIMIT", ws(parse_unsigned)))
        .map(|n| n as i64)
        .parse(input)
}
