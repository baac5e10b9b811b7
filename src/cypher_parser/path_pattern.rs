//! Node and relationship pattern syntax: `(a:Person {name: 'x'})`,
//! `-[:KNOWS]->`, `-[*1..3]->`, undirected `-`.
//!
//! Grounded on `open_cypher_parser/path_pattern.rs`'s approach of parsing a
//! node, then zero or more (relationship, node) hops.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{cut, map, opt},
    error::context,
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, preceded, separated_pair},
    Parser,
};

use super::ast::{Direction, NodePattern, Pattern, PropertyKV, RelLength, RelPattern};
use super::common::{parse_identifier, parse_parameter_name, parse_unsigned, required, ws, PResult};
use super::expression::parse_expression;

/// `p = (a)-[:T]->(b)` or plain `(a)-[:T]->(b)`.
pub fn parse_pattern(input: &str) -> PResult<'_, Pattern<'_>> {
    let (input, path_var) = opt(path_variable_prefix).parse(input)?;
    let (input, start) = parse_node_pattern(input)?;
    let (input, hops) = many0(parse_hop).parse(input)?;
    Ok((
        input,
        Pattern {
            path_var,
            start,
            hops,
        },
    ))
}

fn path_variable_prefix(input: &str) -> PResult<'_, &str> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = ws(char('=')).parse(input)?;
    Ok((input, name))
}

fn parse_hop(input: &str) -> PResult<'_, (RelPattern<'_>, NodePattern<'_>)> {
    let (input, rel) = parse_rel_pattern(input)?;
    let (input, node) = required("node pattern after relationship", parse_node_pattern).parse(input)?;
    Ok((input, (rel, node)))
}

pub fn parse_node_pattern(input: &str) -> PResult<'_, NodePattern<'_>> {
    let (input, _) = ws(char('(')).parse(input)?;
    let (input, variable) = opt(parse_identifier).parse(input)?;
    let (input, label) = opt(preceded(ws(char(':')), parse_identifier)).parse(input)?;
    let (input, properties) = opt(parse_property_map).parse(input)?;
    let (input, _) = context("closing ')' of node pattern", cut(ws(char(')')))).parse(input)?;
    Ok((
        input,
        NodePattern {
            variable,
            label,
            properties,
        },
    ))
}

/// `-[...]->`, `<-[...]-`, or undirected `-[...]-`.
fn parse_rel_pattern(input: &str) -> PResult<'_, RelPattern<'_>> {
    let (input, incoming_arrow) = opt(ws(char('<'))).parse(input)?;
    let (input, _) = ws(char('-')).parse(input)?;
    let (input, detail) = opt(delimited(
        ws(char('[')),
        parse_rel_detail,
        context("closing ']' of relationship pattern", cut(ws(char(']')))),
    ))
    .parse(input)?;
    let (input, _) = ws(char('-')).parse(input)?;
    let (input, outgoing_arrow) = opt(ws(char('>'))).parse(input)?;

    let direction = match (incoming_arrow.is_some(), outgoing_arrow.is_some()) {
        (true, false) => Direction::Incoming,
        (false, true) => Direction::Outgoing,
        (false, false) => Direction::Either,
        (true, true) => Direction::Either, // malformed `<-...->`, treat as undirected
    };

    let (variable, types, length, properties) = detail.unwrap_or((None, Vec::new(), RelLength::Fixed, None));

    Ok((
        input,
        RelPattern {
            variable,
            types,
            direction,
            length,
            properties,
        },
    ))
}

type RelDetail<'a> = (
    Option<&'a str>,
    Vec<&'a str>,
    RelLength,
    Option<Vec<PropertyKV<'a>>>,
);

fn parse_rel_detail(input: &str) -> PResult<'_, RelDetail<'_>> {
    let (input, variable) = opt(parse_identifier).parse(input)?;
    let (input, types) = opt(preceded(
        ws(char(':')),
        separated_list1(ws(char('|')), parse_identifier),
    ))
    .parse(input)?;
    let (input, length) = opt(parse_variable_length).parse(input)?;
    let (input, properties) = opt(parse_property_map).parse(input)?;
    Ok((
        input,
        (
            variable,
            types.unwrap_or_default(),
            length.unwrap_or(RelLength::Fixed),
            properties,
        ),
    ))
}

/// `*`, `*n`, `*n..`, `*..m`, `*n..m`.
fn parse_variable_length(input: &str) -> PResult<'_, RelLength> {
    let (input, _) = char('*').parse(input)?;
    let (input, min) = opt(parse_unsigned).parse(input)?;
    let (input, dotdot) = opt(tag("..")).parse(input)?;
    let (input, max) = if dotdot.is_some() {
        opt(parse_unsigned).parse(input)?
    } else {
        (input, None)
    };

    let length = match (min, dotdot.is_some(), max) {
        (None, false, _) => RelLength::Range { min: 1, max: None }, // bare `*` = [1..∞]
        (Some(n), false, _) => RelLength::Range { min: n, max: Some(n) }, // `*n` fixed
        (min, true, max) => RelLength::Range {
            min: min.unwrap_or(1),
            max,
        },
    };
    Ok((input, length))
}

fn parse_property_map(input: &str) -> PResult<'_, Vec<PropertyKV<'_>>> {
    delimited(
        ws(char('{')),
        separated_list0(
            ws(char(',')),
            map(
                separated_pair(parse_identifier, ws(char(':')), property_value),
                |(key, value)| PropertyKV { key, value },
            ),
        ),
        context("closing '}' of property map", cut(ws(char('}')))),
    )
    .parse(input)
}

fn property_value(input: &str) -> PResult<'_, super::ast::Expression<'_>> {
    alt((
        map(parse_parameter_name, super::ast::Expression::Param),
        parse_expression,
    ))
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher_parser::ast::Expression;

    #[test]
    fn parses_bare_node() {
        let (rest, node) = parse_node_pattern("(n:Person)").unwrap();
        assert_eq!(rest, "");
        assert_eq!(node.variable, Some("n"));
        assert_eq!(node.label, Some("Person"));
    }

    #[test]
    fn parses_node_with_properties() {
        let (_, node) = parse_node_pattern("(n:Person {name: 'Alice'})").unwrap();
        let props = node.properties.unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].key, "name");
    }

    #[test]
    fn parses_outgoing_relationship() {
        let (rest, pattern) = parse_pattern("(a:Person)-[r:KNOWS]->(b:Person)").unwrap();
        assert_eq!(rest, "");
        assert_eq!(pattern.hops.len(), 1);
        let (rel, node) = &pattern.hops[0];
        assert_eq!(rel.direction, Direction::Outgoing);
        assert_eq!(rel.types, vec!["KNOWS"]);
        assert_eq!(node.variable, Some("b"));
    }

    #[test]
    fn parses_incoming_relationship() {
        let (_, pattern) = parse_pattern("(a)<-[:KNOWS]-(b)").unwrap();
        assert_eq!(pattern.hops[0].0.direction, Direction::Incoming);
    }

    #[test]
    fn parses_undirected_relationship() {
        let (_, pattern) = parse_pattern("(a)-[:KNOWS]-(b)").unwrap();
        assert_eq!(pattern.hops[0].0.direction, Direction::Either);
    }

    #[test]
    fn parses_variable_length_bare_star() {
        let (_, pattern) = parse_pattern("(a)-[:KNOWS*]->(b)").unwrap();
        assert_eq!(pattern.hops[0].0.length, RelLength::Range { min: 1, max: None });
    }

    #[test]
    fn parses_variable_length_range() {
        let (_, pattern) = parse_pattern("(a)-[:KNOWS*1..3]->(b)").unwrap();
        assert_eq!(
            pattern.hops[0].0.length,
            RelLength::Range { min: 1, max: Some(3) }
        );
    }

    #[test]
    fn parses_variable_length_min_only() {
        let (_, pattern) = parse_pattern("(a)-[:KNOWS*2..]->(b)").unwrap();
        assert_eq!(
            pattern.hops[0].0.length,
            RelLength::Range { min: 2, max: None }
        );
    }

    #[test]
    fn parses_variable_length_max_only() {
        let (_, pattern) = parse_pattern("(a)-[:KNOWS*..5]->(b)").unwrap();
        assert_eq!(
            pattern.hops[0].0.length,
            RelLength::Range { min: 1, max: Some(5) }
        );
    }

    #[test]
    fn parses_path_variable() {
        let (_, pattern) = parse_pattern("p = (a)-[:KNOWS]->(b)").unwrap();
        assert_eq!(pattern.path_var, Some("p"));
    }

    #[test]
    fn parses_multiple_relationship_types() {
        let (_, pattern) = parse_pattern("(a)-[:KNOWS|LIKES]->(b)").unwrap();
        assert_eq!(pattern.hops[0].0.types, vec!["KNOWS", "LIKES"]);
    }

    #[test]
    fn property_value_accepts_parameter() {
        let (_, node) = parse_node_pattern("(n {id: $id})").unwrap();
        let props = node.properties.unwrap();
        assert!(matches!(props[0].value, Expression::Param("id")));
    }
}
