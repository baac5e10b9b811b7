//! `REMOVE v.k (, v.k)*`.

use nom::{character::complete::char, multi::separated_list1, Parser};

use super::ast::{PropertyAccess, Remove};
use super::common::{keyword, parse_identifier, required, ws, PResult};

pub fn parse_remove_clause(input: &str) -> PResult<'_, Remove<'_>> {
    let (input, _) = ws(keyword("REMOVE")).parse(input)?;
    let (input, items) = required(
        "one or more comma-separated property references",
        separated_list1(ws(char(',')), parse_property_ref),
    )
    .parse(input)?;
    Ok((input, Remove { items }))
}

fn parse_property_ref(input: &str) -> PResult<'_, PropertyAccess<'_>> {
    let (input, base) = parse_identifier(input)?;
    let (input, _) = char('.').parse(input)?;
    let (input, key) = parse_identifier(input)?;
    Ok((input, PropertyAccess { base, key }))
}
