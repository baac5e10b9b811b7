//! `MERGE pattern (ON MATCH SET ...)? (ON CREATE SET ...)?` in either order.

use nom::Parser;

use super::ast::{Merge, SetItem};
use super::common::{keyword, required, ws, PResult};
use super::path_pattern::parse_pattern;
use super::set_clause::parse_set_items;

pub fn parse_merge_clause(input: &str) -> PResult<'_, Merge<'_>> {
    let (input, _) = ws(keyword("MERGE")).parse(input)?;
    let (input, pattern) = required("a pattern after MERGE", parse_pattern).parse(input)?;

    let mut on_match = Vec::new();
    let mut on_create = Vec::new();
    let mut rest = input;
    for _ in 0..2 {
        if let Ok((r, items)) = parse_on_match(rest) {
            on_match = items;
            rest = r;
            continue;
        }
        if let Ok((r, items)) = parse_on_create(rest) {
            on_create = items;
            rest = r;
            continue;
        }
        break;
    }

    Ok((
        rest,
        Merge {
            pattern,
            on_match,
            on_create,
        },
    ))
}

fn parse_on_match(input: &str) -> PResult<'_, Vec<SetItem<'_>>> {
    let (input, _) = ws(keyword("ON")).parse(input)?;
    let (input, _) = required("MATCH", ws(keyword("MATCH"))).parse(input)?;
    let (input, _) = required("SET", ws(keyword("SET"))).parse(input)?;
    parse_set_items(input)
}

fn parse_on_create(input: &str) -> PResult<'_, Vec<SetItem<'_>>> {
    let (input, _) = ws(keyword("ON")).parse(input)?;
    let (input, _) = required("CREATE", ws(keyword("CREATE"))).parse(input)?;
    let (input, _) = required("SET", ws(keyword("SET"))).parse(input)?;
    parse_set_items(input)
}
