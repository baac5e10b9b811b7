//! `SET v.k = expr (, v.k = expr)*` — also reused for `MERGE`'s
//! `ON MATCH SET` / `ON CREATE SET` item lists.

use nom::{character::complete::char, multi::separated_list1, sequence::separated_pair, Parser};

use super::ast::{PropertyAccess, Set, SetItem};
use super::common::{keyword, parse_identifier, required, ws, PResult};
use super::expression::parse_expression;

pub fn parse_set_clause(input: &str) -> PResult<'_, Set<'_>> {
    let (input, _) = ws(keyword("SET")).parse(input)?;
    let (input, items) = parse_set_items(input)?;
    Ok((input, Set { items }))
}

pub fn parse_set_items(input: &str) -> PResult<'_, Vec<SetItem<'_>>> {
    required(
        "one or more comma-separated assignments",
        separated_list1(ws(char(',')), parse_set_item),
    )
    .parse(input)
}

fn parse_set_item(input: &str) -> PResult<'_, SetItem<'_>> {
    let (input, (target, value)) = separated_pair(parse_property_target, ws(char('=')), parse_expression).parse(input)?;
    Ok((input, SetItem { target, value }))
}

fn parse_property_target(input: &str) -> PResult<'_, PropertyAccess<'_>> {
    let (input, base) = parse_identifier(input)?;
    let (input, _) = char('.').parse(input)?;
    let (input, key) = parse_identifier(input)?;
    Ok((input, PropertyAccess { base, key }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_assignment() {
        let (rest, s) = parse_set_clause("SET n.name = 'Bob'").unwrap();
        assert_eq!(rest, "");
        assert_eq!(s.items[0].target.key, "name");
    }

    #[test]
    fn parses_multiple_assignments() {
        let (_, s) = parse_set_clause("SET n.name = 'Bob', n.age = 30").unwrap();
        assert_eq!(s.items.len(), 2);
    }
}
