//! Expression grammar: operator precedence, property access, function
//! calls, `CASE`, list/map literals, parameters.
//!
//! Grounded on `open_cypher_parser/expression.rs`'s precedence-climbing
//! shape (`parse_logical_or` down to a postfix/primary parser), simplified
//! to the variant set `spec.md` §3 actually names.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{cut, map, opt, value},
    error::context,
    multi::separated_list0,
    sequence::{delimited, pair, preceded, separated_pair},
    Parser,
};

use super::ast::{
    BinOperator, Case, CompareOperator, Expression, FunctionCall, LikeKind, Literal,
    PropertyAccess, UnaryOperator,
};
use super::common::{
    keyword, parse_bool, parse_identifier, parse_null_kw, parse_numeric, parse_parameter_name,
    parse_string_literal, required, ws, NumericText, PResult,
};

pub fn parse_expression(input: &str) -> PResult<'_, Expression<'_>> {
    parse_or(input)
}

fn parse_or(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, first) = parse_xor(input)?;
    fold_binary(input, first, keyword("OR"), BinOperator::Or, parse_xor)
}

fn parse_xor(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, first) = parse_and(input)?;
    fold_binary(input, first, keyword("XOR"), BinOperator::Xor, parse_and)
}

fn parse_and(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, first) = parse_not(input)?;
    fold_binary(input, first, keyword("AND"), BinOperator::And, parse_not)
}

fn parse_not(input: &str) -> PResult<'_, Expression<'_>> {
    if let Ok((rest, _)) = ws(keyword("NOT")).parse(input) {
        let (rest, expr) = required("expression after NOT", parse_not).parse(rest)?;
        return Ok((
            rest,
            Expression::UnaryOp {
                op: UnaryOperator::Not,
                expr: Box::new(expr),
            },
        ));
    }
    parse_predicate(input)
}

/// Comparison / `IN` / `STARTS WITH` / `ENDS WITH` / `CONTAINS` / `=~` /
/// `IS [NOT] NULL`. Cypher doesn't chain these, so a single optional
/// trailing operator is enough.
fn parse_predicate(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, lhs) = parse_additive(input)?;
    let (input, _) = nom::character::complete::multispace0(input)?;

    if let Ok((rest, op)) = compare_op(input) {
        let (rest, rhs) = required("right-hand side of comparison", parse_additive).parse(rest)?;
        return Ok((
            rest,
            Expression::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        ));
    }
    if let Ok((rest, _)) = keyword("IN")(input) {
        let (rest, list) = required("list or parameter after IN", parse_additive).parse(rest)?;
        return Ok((
            rest,
            Expression::In {
                expr: Box::new(lhs),
                list: Box::new(list),
            },
        ));
    }
    if let Ok((rest, _)) = tag::<_, _, super::errors::InternalParseError<'_>>("=~")(input) {
        let (rest, pattern) = required("pattern after =~", parse_additive).parse(rest)?;
        return Ok((
            rest,
            Expression::RegexMatch {
                expr: Box::new(lhs),
                pattern: Box::new(pattern),
            },
        ));
    }
    if let Ok((rest, kind)) = like_kw(input) {
        let (rest, pattern) = required("string after STARTS WITH/ENDS WITH/CONTAINS", parse_additive).parse(rest)?;
        return Ok((
            rest,
            Expression::Like {
                kind,
                expr: Box::new(lhs),
                pattern: Box::new(pattern),
            },
        ));
    }
    if let Ok((rest, negated)) = is_null_kw(input) {
        return Ok((
            rest,
            Expression::IsNull {
                expr: Box::new(lhs),
                negated,
            },
        ));
    }
    Ok((input, lhs))
}

fn compare_op(input: &str) -> PResult<'_, CompareOperator> {
    alt((
        value(CompareOperator::Ne, tag("<>")),
        value(CompareOperator::Le, tag("<=")),
        value(CompareOperator::Ge, tag(">=")),
        value(CompareOperator::Eq, tag("=")),
        value(CompareOperator::Lt, tag("<")),
        value(CompareOperator::Gt, tag(">")),
    ))
    .parse(input)
}

fn like_kw(input: &str) -> PResult<'_, LikeKind> {
    alt((
        map(
            pair(ws(keyword("STARTS")), required("WITH", ws(keyword("WITH")))),
            |_| LikeKind::StartsWith,
        ),
        map(
            pair(ws(keyword("ENDS")), required("WITH", ws(keyword("WITH")))),
            |_| LikeKind::EndsWith,
        ),
        map(ws(keyword("CONTAINS")), |_| LikeKind::Contains),
    ))
    .parse(input)
}

fn is_null_kw(input: &str) -> PResult<'_, bool> {
    let (input, _) = ws(keyword("IS")).parse(input)?;
    if let Ok((rest, _)) = ws(keyword("NOT")).parse(input) {
        let (rest, _) = required("NULL", ws(parse_null_kw)).parse(rest)?;
        return Ok((rest, true));
    }
    let (rest, _) = required("NULL", ws(parse_null_kw)).parse(input)?;
    Ok((rest, false))
}

fn parse_additive(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, first) = parse_multiplicative(input)?;
    fold_binary_choice(
        input,
        first,
        &[
            (tag("+"), BinOperator::Add),
            (tag("-"), BinOperator::Sub),
        ],
        parse_multiplicative,
    )
}

fn parse_multiplicative(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, first) = parse_power(input)?;
    fold_binary_choice(
        input,
        first,
        &[
            (tag("*"), BinOperator::Mul),
            (tag("/"), BinOperator::Div),
            (tag("%"), BinOperator::Mod),
        ],
        parse_power,
    )
}

fn parse_power(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, first) = parse_unary(input)?;
    fold_binary(input, first, tag("^"), BinOperator::Pow, parse_unary)
}

fn parse_unary(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, _) = nom::character::complete::multispace0(input)?;
    if let Ok((rest, _)) = char::<_, super::errors::InternalParseError<'_>>('-')(input) {
        let (rest, expr) = parse_unary(rest)?;
        return Ok((
            rest,
            Expression::UnaryOp {
                op: UnaryOperator::Neg,
                expr: Box::new(expr),
            },
        ));
    }
    parse_postfix(input)
}

fn parse_postfix(input: &str) -> PResult<'_, Expression<'_>> {
    parse_primary(input)
}

fn parse_primary(input: &str) -> PResult<'_, Expression<'_>> {
    ws(alt((
        parse_case_expression,
        parse_parameter_expr,
        parse_property_access,
        parse_function_call,
        parse_list_literal,
        parse_map_literal,
        parse_literal_expr,
        parse_variable_expr,
        delimited(ws(char('(')), parse_expression, ws(char(')'))),
    )))
    .parse(input)
}

fn parse_parameter_expr(input: &str) -> PResult<'_, Expression<'_>> {
    map(parse_parameter_name, Expression::Param).parse(input)
}

fn parse_property_access(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, base) = parse_identifier(input)?;
    let (input, _) = char('.')(input)?;
    let (input, key) = cut(parse_identifier).parse(input)?;
    Ok((
        input,
        Expression::PropertyAccess(PropertyAccess { base, key }),
    ))
}

fn parse_variable_expr(input: &str) -> PResult<'_, Expression<'_>> {
    map(parse_identifier, Expression::Variable).parse(input)
}

fn parse_literal_expr(input: &str) -> PResult<'_, Expression<'_>> {
    alt((
        map(parse_bool, |b| Expression::Literal(Literal::Bool(b))),
        map(parse_null_kw, |_| Expression::Literal(Literal::Null)),
        map(parse_string_literal, |s| Expression::Literal(Literal::Str(s))),
        map(parse_numeric, |(text, kind)| match kind {
            NumericText::Int => match text.parse::<i64>() {
                Ok(v) => Expression::Literal(Literal::Int(v)),
                Err(_) => Expression::Literal(Literal::Float(text.parse().unwrap_or(0.0))),
            },
            NumericText::Float => Expression::Literal(Literal::Float(text.parse().unwrap_or(0.0))),
        }),
    ))
    .parse(input)
}

fn parse_list_literal(input: &str) -> PResult<'_, Expression<'_>> {
    map(
        delimited(
            ws(char('[')),
            separated_list0(ws(char(',')), parse_expression),
            ws(char(']')),
        ),
        Expression::List,
    )
    .parse(input)
}

fn parse_map_literal(input: &str) -> PResult<'_, Expression<'_>> {
    map(
        delimited(
            ws(char('{')),
            separated_list0(
                ws(char(',')),
                separated_pair(parse_identifier, ws(char(':')), parse_expression),
            ),
            ws(char('}')),
        ),
        Expression::Map,
    )
    .parse(input)
}

/// A name immediately followed by `(` is a function call. `COUNT(*)` and
/// `COUNT(DISTINCT x)` are both recognised.
fn parse_function_call(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = ws(char('(')).parse(input)?;
    let (input, distinct) = opt(ws(keyword("DISTINCT"))).parse(input)?;
    let (input, args) = if let Ok((rest, _)) = ws(char::<_, super::errors::InternalParseError<'_>>('*')).parse(input) {
        (rest, Vec::new())
    } else {
        separated_list0(ws(char(',')), parse_expression).parse(input)?
    };
    let (input, _) = context("closing ')' of function call", cut(ws(char(')')))).parse(input)?;
    Ok((
        input,
        Expression::FunctionCall(FunctionCall {
            name: name.to_string(),
            args,
            distinct: distinct.is_some(),
        }),
    ))
}

fn parse_case_expression(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, _) = ws(keyword("CASE")).parse(input)?;
    let (input, _) = nom::character::complete::multispace0(input)?;
    // `WHEN` is a reserved word, so `parse_expression` fails to consume it
    // and `opt` naturally falls back to the searched-CASE form.
    let (input, subject) = opt(parse_expression).parse(input)?;
    let (input, when_then) = nom::multi::many1(parse_when_then).parse(input)?;
    let (input, else_) = opt(preceded(ws(keyword("ELSE")), parse_expression)).parse(input)?;
    let (input, _) = context("END of CASE expression", cut(ws(keyword("END")))).parse(input)?;
    Ok((
        input,
        Expression::Case(Case {
            subject: subject.map(Box::new),
            when_then,
            else_: else_.map(Box::new),
        }),
    ))
}

fn parse_when_then(input: &str) -> PResult<'_, (Expression<'_>, Expression<'_>)> {
    let (input, _) = ws(keyword("WHEN")).parse(input)?;
    let (input, cond) = required("condition after WHEN", parse_expression).parse(input)?;
    let (input, _) = required("THEN", ws(keyword("THEN"))).parse(input)?;
    let (input, then) = required("expression after THEN", parse_expression).parse(input)?;
    Ok((input, (cond, then)))
}

fn fold_binary<'a, F, O>(
    mut input: &'a str,
    mut acc: Expression<'a>,
    mut op_parser: impl FnMut(&'a str) -> PResult<'a, O>,
    op: BinOperator,
    mut operand: F,
) -> PResult<'a, Expression<'a>>
where
    F: FnMut(&'a str) -> PResult<'a, Expression<'a>>,
{
    loop {
        let (rest, _) = nom::character::complete::multispace0(input)?;
        match op_parser(rest) {
            Ok((rest2, _)) => {
                let (rest3, rhs) = required("right-hand operand", &mut operand).parse(rest2)?;
                acc = Expression::BinOp {
                    op,
                    lhs: Box::new(acc),
                    rhs: Box::new(rhs),
                };
                input = rest3;
            }
            Err(_) => return Ok((input, acc)),
        }
    }
}

fn fold_binary_choice<'a, F>(
    mut input: &'a str,
    mut acc: Expression<'a>,
    ops: &[(impl Fn(&'a str) -> PResult<'a, &'a str>, BinOperator)],
    mut operand: F,
) -> PResult<'a, Expression<'a>>
where
    F: FnMut(&'a str) -> PResult<'a, Expression<'a>>,
{
    'outer: loop {
        let (rest, _) = nom::character::complete::multispace0(input)?;
        for (matcher, op) in ops {
            if let Ok((rest2, _)) = matcher(rest) {
                let (rest3, rhs) = required("right-hand operand", &mut operand).parse(rest2)?;
                acc = Expression::BinOp {
                    op: *op,
                    lhs: Box::new(acc),
                    rhs: Box::new(rhs),
                };
                input = rest3;
                continue 'outer;
            }
        }
        return Ok((input, acc));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher_parser::ast::{BinOperator, CompareOperator, Literal};

    #[test]
    fn parses_comparison() {
        let (rest, expr) = parse_expression("a = 1").unwrap();
        assert_eq!(rest, "");
        assert_eq!(
            expr,
            Expression::Compare {
                op: CompareOperator::Eq,
                lhs: Box::new(Expression::Variable("a")),
                rhs: Box::new(Expression::Literal(Literal::Int(1))),
            }
        );
    }

    #[test]
    fn parses_additive_precedence() {
        let (_, expr) = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expression::BinOp {
                op: BinOperator::Add,
                lhs: Box::new(Expression::Literal(Literal::Int(1))),
                rhs: Box::new(Expression::BinOp {
                    op: BinOperator::Mul,
                    lhs: Box::new(Expression::Literal(Literal::Int(2))),
                    rhs: Box::new(Expression::Literal(Literal::Int(3))),
                }),
            }
        );
    }

    #[test]
    fn parses_property_access() {
        let (_, expr) = parse_expression("n.age").unwrap();
        assert_eq!(
            expr,
            Expression::PropertyAccess(PropertyAccess {
                base: "n",
                key: "age"
            })
        );
    }

    #[test]
    fn parses_starts_with() {
        let (_, expr) = parse_expression("n.name STARTS WITH 'A'").unwrap();
        assert!(matches!(expr, Expression::Like { kind: LikeKind::StartsWith, .. }));
    }

    #[test]
    fn parses_function_call_with_distinct() {
        let (_, expr) = parse_expression("COUNT(DISTINCT n)").unwrap();
        match expr {
            Expression::FunctionCall(f) => {
                assert_eq!(f.name, "COUNT");
                assert!(f.distinct);
            }
            other => panic!("expected function call, got {:?}", other),
        }
    }

    #[test]
    fn parses_count_star() {
        let (_, expr) = parse_expression("count(*)").unwrap();
        match expr {
            Expression::FunctionCall(f) => assert!(f.args.is_empty()),
            other => panic!("expected function call, got {:?}", other),
        }
    }

    #[test]
    fn parses_in_list() {
        let (_, expr) = parse_expression("n.id IN [1, 2, 3]").unwrap();
        assert!(matches!(expr, Expression::In { .. }));
    }

    #[test]
    fn parses_is_null() {
        let (_, expr) = parse_expression("n.age IS NOT NULL").unwrap();
        assert!(matches!(expr, Expression::IsNull { negated: true, .. }));
    }

    #[test]
    fn parses_case_searched() {
        let (_, expr) = parse_expression("CASE WHEN n.age > 18 THEN 'adult' ELSE 'minor' END").unwrap();
        assert!(matches!(expr, Expression::Case(_)));
    }

    #[test]
    fn parses_regex_match() {
        let (_, expr) = parse_expression("n.name =~ '^A.*'").unwrap();
        assert!(matches!(expr, Expression::RegexMatch { .. }));
    }

    #[test]
    fn parses_parenthesized() {
        let (_, expr) = parse_expression("(1 + 2) * 3").unwrap();
        assert!(matches!(expr, Expression::BinOp { op: BinOperator::Mul, .. }));
    }
}
