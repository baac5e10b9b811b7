//! Renders a [`CypherAst`] back to Cypher text.
//!
//! Used by the round-trip property in the test suite (parse, pretty-print,
//! re-parse, compare ASTs) rather than for any end-user formatting feature.
//! The output favors unambiguous parenthesization over matching the
//! original source's whitespace or operator precedence choices.

use std::fmt::Write;

use crate::cypher_parser::ast::*;

pub fn pretty_print(ast: &CypherAst<'_>) -> String {
    let mut out = String::new();
    print_query(&ast.first, &mut out);
    for (union_type, query) in &ast.rest {
        match union_type {
            UnionType::Distinct => out.push_str(" UNION "),
            UnionType::All => out.push_str(" UNION ALL "),
        }
        print_query(query, &mut out);
    }
    out
}

fn print_query(query: &Query<'_>, out: &mut String) {
    let mut first = true;
    for clause in &query.clauses {
        if !first {
            out.push(' ');
        }
        first = false;
        print_clause(clause, out);
    }
}

fn print_clause(clause: &Clause<'_>, out: &mut String) {
    match clause {
        Clause::Match(m) => print_match(m, out),
        Clause::Create(c) => print_create(c, out),
        Clause::Merge(m) => print_merge(m, out),
        Clause::Delete(d) => print_delete(d, out),
        Clause::Set(s) => print_set(s, out),
        Clause::Remove(r) => print_remove(r, out),
        Clause::With(w) => print_with(w, out),
        Clause::Return(r) => print_return(r, out),
    }
}

fn print_match(m: &Match<'_>, out: &mut String) {
    if m.optional {
        out.push_str("OPTIONAL ");
    }
    out.push_str("MATCH ");
    print_pattern_list(&m.patterns, out);
    if let Some(expr) = &m.where_ {
        out.push_str(" WHERE ");
        print_expr(expr, out);
    }
}

fn print_create(c: &Create<'_>, out: &mut String) {
    out.push_str("CREATE ");
    print_pattern_list(&c.patterns, out);
}

fn print_merge(m: &Merge<'_>, out: &mut String) {
    out.push_str("MERGE ");
    print_pattern(&m.pattern, out);
    if !m.on_match.is_empty() {
        out.push_str(" ON MATCH SET ");
        print_set_items(&m.on_match, out);
    }
    if !m.on_create.is_empty() {
        out.push_str(" ON CREATE SET ");
        print_set_items(&m.on_create, out);
    }
}

fn print_delete(d: &Delete<'_>, out: &mut String) {
    if d.detach {
        out.push_str("DETACH ");
    }
    out.push_str("DELETE ");
    print_comma_exprs(&d.items, out);
}

fn print_set(s: &Set<'_>, out: &mut String) {
    out.push_str("SET ");
    print_set_items(&s.items, out);
}

fn print_set_items(items: &[SetItem<'_>], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        print_property_access(&item.target, out);
        out.push_str(" = ");
        print_expr(&item.value, out);
    }
}

fn print_remove(r: &Remove<'_>, out: &mut String) {
    out.push_str("REMOVE ");
    for (i, item) in r.items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        print_property_access(item, out);
    }
}

fn print_with(w: &With<'_>, out: &mut String) {
    out.push_str("WITH ");
    if w.distinct {
        out.push_str("DISTINCT ");
    }
    print_projection_items(&w.items, out);
    if let Some(expr) = &w.where_ {
        out.push_str(" WHERE ");
        print_expr(expr, out);
    }
    print_paging(&w.order_by, w.skip, w.limit, out);
}

fn print_return(r: &Return<'_>, out: &mut String) {
    out.push_str("RETURN ");
    if r.distinct {
        out.push_str("DISTINCT ");
    }
    print_projection_items(&r.items, out);
    print_paging(&r.order_by, r.skip, r.limit, out);
}

fn print_paging(order_by: &[OrderByItem<'_>], skip: Option<i64>, limit: Option<i64>, out: &mut String) {
    if !order_by.is_empty() {
        out.push_str(" ORDER BY ");
        for (i, item) in order_by.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            print_expr(&item.expression, out);
            if item.descending {
                out.push_str(" DESC");
            }
        }
    }
    if let Some(n) = skip {
        let _ = write!(out, " SKIP {n}");
    }
    if let Some(n) = limit {
        let _ = write!(out, " LIMIT {n}");
    }
}

fn print_projection_items(items: &[ProjectionItem<'_>], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        print_expr(&item.expression, out);
        if let Some(alias) = item.alias {
            let _ = write!(out, " AS {alias}");
        }
    }
}

fn print_pattern_list(patterns: &[Pattern<'_>], out: &mut String) {
    for (i, p) in patterns.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        print_pattern(p, out);
    }
}

fn print_pattern(pattern: &Pattern<'_>, out: &mut String) {
    if let Some(var) = pattern.path_var {
        let _ = write!(out, "{var} = ");
    }
    print_node(&pattern.start, out);
    for (rel, node) in &pattern.hops {
        print_rel(rel, out);
        print_node(node, out);
    }
}

fn print_node(node: &NodePattern<'_>, out: &mut String) {
    out.push('(');
    if let Some(var) = node.variable {
        out.push_str(var);
    }
    if let Some(label) = node.label {
        let _ = write!(out, ":{label}");
    }
    if let Some(props) = &node.properties {
        out.push(' ');
        print_property_map(props, out);
    }
    out.push(')');
}

fn print_rel(rel: &RelPattern<'_>, out: &mut String) {
    if rel.direction == Direction::Incoming {
        out.push('<');
    }
    out.push('-');
    let has_detail =
        rel.variable.is_some() || !rel.types.is_empty() || rel.properties.is_some() || rel.length != RelLength::Fixed;
    if has_detail {
        out.push('[');
        if let Some(var) = rel.variable {
            out.push_str(var);
        }
        for (i, t) in rel.types.iter().enumerate() {
            out.push_str(if i == 0 { ":" } else { "|" });
            out.push_str(t);
        }
        print_rel_length(&rel.length, out);
        if let Some(props) = &rel.properties {
            out.push(' ');
            print_property_map(props, out);
        }
        out.push(']');
    }
    out.push('-');
    if rel.direction == Direction::Outgoing {
        out.push('>');
    }
}

fn print_rel_length(length: &RelLength, out: &mut String) {
    match length {
        RelLength::Fixed => {}
        RelLength::Range { min: 1, max: None } => out.push('*'),
        RelLength::Range { min, max: Some(max) } if min == max => {
            let _ = write!(out, "*{min}");
        }
        RelLength::Range { min: 1, max: Some(max) } => {
            let _ = write!(out, "*..{max}");
        }
        RelLength::Range { min, max: None } => {
            let _ = write!(out, "*{min}..");
        }
        RelLength::Range { min, max: Some(max) } => {
            let _ = write!(out, "*{min}..{max}");
        }
    }
}

fn print_property_map(props: &[PropertyKV<'_>], out: &mut String) {
    out.push('{');
    for (i, kv) in props.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}: ", kv.key);
        print_expr(&kv.value, out);
    }
    out.push('}');
}

fn print_property_access(access: &PropertyAccess<'_>, out: &mut String) {
    let _ = write!(out, "{}.{}", access.base, access.key);
}

fn print_comma_exprs(exprs: &[Expression<'_>], out: &mut String) {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        print_expr(e, out);
    }
}

fn print_expr(expr: &Expression<'_>, out: &mut String) {
    match expr {
        Expression::Literal(lit) => print_literal(lit, out),
        Expression::Variable(v) => out.push_str(v),
        Expression::Param(p) => {
            let _ = write!(out, "${p}");
        }
        Expression::List(items) => {
            out.push('[');
            print_comma_exprs(items, out);
            out.push(']');
        }
        Expression::Map(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{key}: ");
                print_expr(value, out);
            }
            out.push('}');
        }
        Expression::PropertyAccess(access) => print_property_access(access, out),
        Expression::FunctionCall(call) => {
            let _ = write!(out, "{}(", call.name);
            if call.distinct {
                out.push_str("DISTINCT ");
            }
            print_comma_exprs(&call.args, out);
            out.push(')');
        }
        Expression::BinOp { op, lhs, rhs } => print_binop(*op, lhs, rhs, out),
        Expression::UnaryOp { op, expr } => {
            match op {
                UnaryOperator::Neg => out.push('-'),
                UnaryOperator::Not => out.push_str("NOT "),
            }
            out.push('(');
            print_expr(expr, out);
            out.push(')');
        }
        Expression::Compare { op, lhs, rhs } => {
            out.push('(');
            print_expr(lhs, out);
            out.push_str(compare_op_text(*op));
            print_expr(rhs, out);
            out.push(')');
        }
        Expression::In { expr, list } => {
            out.push('(');
            print_expr(expr, out);
            out.push_str(" IN ");
            print_expr(list, out);
            out.push(')');
        }
        Expression::IsNull { expr, negated } => {
            out.push('(');
            print_expr(expr, out);
            out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            out.push(')');
        }
        Expression::Like { kind, expr, pattern } => {
            out.push('(');
            print_expr(expr, out);
            out.push_str(match kind {
                LikeKind::StartsWith => " STARTS WITH ",
                LikeKind::EndsWith => " ENDS WITH ",
                LikeKind::Contains => " CONTAINS ",
            });
            print_expr(pattern, out);
            out.push(')');
        }
        Expression::RegexMatch { expr, pattern } => {
            out.push('(');
            print_expr(expr, out);
            out.push_str(" =~ ");
            print_expr(pattern, out);
            out.push(')');
        }
        Expression::Case(case) => print_case(case, out),
    }
}

fn print_binop(op: BinOperator, lhs: &Expression<'_>, rhs: &Expression<'_>, out: &mut String) {
    out.push('(');
    print_expr(lhs, out);
    out.push_str(match op {
        BinOperator::Add => " + ",
        BinOperator::Sub => " - ",
        BinOperator::Mul => " * ",
        BinOperator::Div => " / ",
        BinOperator::Mod => " % ",
        BinOperator::Pow => " ^ ",
        BinOperator::And => " AND ",
        BinOperator::Or => " OR ",
        BinOperator::Xor => " XOR ",
    });
    print_expr(rhs, out);
    out.push(')');
}

fn compare_op_text(op: CompareOperator) -> &'static str {
    match op {
        CompareOperator::Eq => " = ",
        CompareOperator::Ne => " <> ",
        CompareOperator::Lt => " < ",
        CompareOperator::Gt => " > ",
        CompareOperator::Le => " <= ",
        CompareOperator::Ge => " >= ",
    }
}

fn print_case(case: &Case<'_>, out: &mut String) {
    out.push_str("CASE ");
    if let Some(subject) = &case.subject {
        print_expr(subject, out);
        out.push(' ');
    }
    for (when, then) in &case.when_then {
        out.push_str("WHEN ");
        print_expr(when, out);
        out.push_str(" THEN ");
        print_expr(then, out);
        out.push(' ');
    }
    if let Some(else_) = &case.else_ {
        out.push_str("ELSE ");
        print_expr(else_, out);
        out.push(' ');
    }
    out.push_str("END");
}

fn print_literal(lit: &Literal<'_>, out: &mut String) {
    match lit {
        Literal::Int(n) => {
            let _ = write!(out, "{n}");
        }
        Literal::Float(f) => {
            let _ = write!(out, "{f}");
        }
        Literal::Str(s) => {
            let _ = write!(out, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"));
        }
        Literal::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Literal::Null => out.push_str("null"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_simple_match_return() {
        let ast = crate::cypher_parser::parse("MATCH (n:Person) RETURN n.name").unwrap();
        let printed = pretty_print(&ast);
        let reparsed = crate::cypher_parser::parse(&printed).unwrap();
        assert_eq!(ast, reparsed);
    }

    #[test]
    fn round_trips_with_aggregation_and_paging() {
        let ast = crate::cypher_parser::parse(
            "MATCH (n:Person)-[:KNOWS]->(m:Person) WITH n, count(m) AS friends WHERE friends > 1 RETURN n.name, friends ORDER BY friends DESC LIMIT 10",
        )
        .unwrap();
        let printed = pretty_print(&ast);
        let reparsed = crate::cypher_parser::parse(&printed).unwrap();
        assert_eq!(ast, reparsed);
    }

    #[test]
    fn round_trips_variable_length_path() {
        let ast = crate::cypher_parser::parse("MATCH (a:Person)-[:KNOWS*1..3]->(b:Person) RETURN b").unwrap();
        let printed = pretty_print(&ast);
        let reparsed = crate::cypher_parser::parse(&printed).unwrap();
        assert_eq!(ast, reparsed);
    }

    #[test]
    fn round_trips_union() {
        let ast =
            crate::cypher_parser::parse("MATCH (n:Person) RETURN n.name UNION ALL MATCH (n:Company) RETURN n.name")
                .unwrap();
        let printed = pretty_print(&ast);
        let reparsed = crate::cypher_parser::parse(&printed).unwrap();
        assert_eq!(ast, reparsed);
    }
}
