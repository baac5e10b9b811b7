//! `CREATE pattern (, pattern)*`.

use nom::{character::complete::char, multi::separated_list1, Parser};

use super::ast::Create;
use super::common::{keyword, required, ws, PResult};
use super::path_pattern::parse_pattern;

pub fn parse_create_clause(input: &str) -> PResult<'_, Create<'_>> {
    let (input, _) = ws(keyword("CREATE")).parse(input)?;
    let (input, patterns) = required(
        "one or more comma-separated patterns",
        separated_list1(ws(char(',')), parse_pattern),
    )
    .parse(input)?;
    Ok((input, Create { patterns }))
}
