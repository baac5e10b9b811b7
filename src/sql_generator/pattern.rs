//! Pattern → FROM/JOIN translation (`spec.md` §4.3.1) and variable-length
//! paths → recursive CTEs (§4.3.2).

use serde_json::Value;

use crate::cypher_parser::ast::{Direction, Match, NodePattern, Pattern, RelLength, RelPattern};
use crate::schema::TableKind;

use super::context::{Binding, GenerationContext};
use super::errors::GenerationError;
use super::expr::render_expr;
use super::state::QueryState;

pub fn add_match(state: &mut QueryState, ctx: &mut GenerationContext<'_>, m: &Match<'_>) -> Result<(), GenerationError> {
    let join_kw = if m.optional { "LEFT JOIN" } else { "JOIN" };
    for pattern in &m.patterns {
        add_pattern(state, ctx, pattern, join_kw)?;
    }
    if let Some(where_expr) = &m.where_ {
        let sql = render_expr(ctx, where_expr)?;
        state.push_predicate(sql);
    }
    Ok(())
}

fn add_pattern(
    state: &mut QueryState,
    ctx: &mut GenerationContext<'_>,
    pattern: &Pattern<'_>,
    join_kw: &str,
) -> Result<(), GenerationError> {
    let mut prev_alias = bind_start_node(state, ctx, &pattern.start)?;
    for (i, (rel, node)) in pattern.hops.iter().enumerate() {
        if rel.length != RelLength::Fixed {
            if pattern.hops.len() != 1 || i != 0 {
                return Err(GenerationError::UnsupportedPatternShape(
                    "a variable-length relationship must be the only hop in its pattern",
                ));
            }
            prev_alias = add_variable_length_hop(state, ctx, &prev_alias, rel, node, join_kw)?;
            continue;
        }
        prev_alias = add_fixed_hop(state, ctx, &prev_alias, rel, node, join_kw)?;
    }
    Ok(())
}

fn add_tenant_predicate(state: &mut QueryState, alias: &str) {
    state.push_predicate(format!("{alias}.group_id = {}", GenerationContext::TENANT_PARAM));
}

fn add_node_filter_predicates(
    state: &mut QueryState,
    ctx: &mut GenerationContext<'_>,
    alias: &str,
    node: &NodePattern<'_>,
) -> Result<(), GenerationError> {
    if let Some(label) = node.label {
        let param = ctx.bind_value(Value::String(label.to_string()));
        state.push_predicate(format!("{alias}.{} = {param}", TableKind::Node.type_column()));
    }
    if let Some(props) = &node.properties {
        for kv in props {
            let value_sql = render_expr(ctx, &kv.value)?;
            if TableKind::Node.known_columns().contains(kv.key) {
                state.push_predicate(format!("{alias}.{} = {value_sql}", kv.key));
            } else {
                state.push_predicate(format!("({alias}.properties->>'{}') = {value_sql}", kv.key));
            }
        }
    }
    Ok(())
}

fn add_edge_filter_predicates(
    state: &mut QueryState,
    ctx: &mut GenerationContext<'_>,
    alias: &str,
    rel: &RelPattern<'_>,
) -> Result<(), GenerationError> {
    if let Some(pred) = type_predicate_list(ctx, &format!("{alias}."), &rel.types) {
        state.push_predicate(pred);
    }
    if let Some(props) = &rel.properties {
        for kv in props {
            let value_sql = render_expr(ctx, &kv.value)?;
            if TableKind::Edge.known_columns().contains(kv.key) {
                state.push_predicate(format!("{alias}.{} = {value_sql}", kv.key));
            } else {
                state.push_predicate(format!("({alias}.properties->>'{}') = {value_sql}", kv.key));
            }
        }
    }
    Ok(())
}

fn type_predicate_list(ctx: &mut GenerationContext<'_>, column_prefix: &str, types: &[&str]) -> Option<String> {
    if types.is_empty() {
        return None;
    }
    let mut preds = Vec::with_capacity(types.len());
    for t in types {
        let param = ctx.bind_value(Value::String((*t).to_string()));
        preds.push(format!("{column_prefix}relation_type = {param}"));
    }
    Some(if preds.len() == 1 {
        preds.remove(0)
    } else {
        format!("({})", preds.join(" OR "))
    })
}

/// Binds the first node of a pattern. If its variable is already bound
/// (e.g. a second `MATCH` or a comma-separated pattern reusing a variable)
/// no new `FROM`/`JOIN` fragment is added — this is what makes concatenated
/// `MATCH`es produce the same join set as one `MATCH` with multiple
/// comma-separated patterns (`spec.md` §8 invariant 8).
fn bind_start_node(
    state: &mut QueryState,
    ctx: &mut GenerationContext<'_>,
    node: &NodePattern<'_>,
) -> Result<String, GenerationError> {
    if let Some(var) = node.variable {
        if let Some(Binding::Table { alias, kind: TableKind::Node }) = ctx.lookup(var).cloned() {
            add_node_filter_predicates(state, ctx, &alias, node)?;
            return Ok(alias);
        }
    }
    let alias = ctx.fresh_node_alias();
    if state.from.is_none() {
        state.set_from(format!("{} {alias}", TableKind::Node.table_name()));
    } else {
        state.push_join(format!("CROSS JOIN {} {alias}", TableKind::Node.table_name()));
    }
    add_tenant_predicate(state, &alias);
    if let Some(var) = node.variable {
        ctx.bind_table(var, alias.clone(), TableKind::Node);
    }
    add_node_filter_predicates(state, ctx, &alias, node)?;
    Ok(alias)
}

fn bind_hop_node(
    state: &mut QueryState,
    ctx: &mut GenerationContext<'_>,
    edge_alias: &str,
    direction: Direction,
    node: &NodePattern<'_>,
    join_kw: &str,
) -> Result<String, GenerationError> {
    if let Some(var) = node.variable {
        if let Some(Binding::Table { alias, kind: TableKind::Node }) = ctx.lookup(var).cloned() {
            add_node_filter_predicates(state, ctx, &alias, node)?;
            return Ok(alias);
        }
    }
    let alias = ctx.fresh_node_alias();
    let column = match direction {
        Direction::Outgoing => "target",
        Direction::Incoming => "source",
        // The endpoint not already used as the join key on the other side
        // of an undirected hop; `target` is an arbitrary but consistent
        // choice (`spec.md` §4.3.1: "for — it is the endpoint not used
        // above").
        Direction::Either => "target",
    };
    state.push_join(format!("{join_kw} {} {alias} ON {edge_alias}.{column} = {alias}.uuid", TableKind::Node.table_name()));
    add_tenant_predicate(state, &alias);
    if let Some(var) = node.variable {
        ctx.bind_table(var, alias.clone(), TableKind::Node);
    }
    add_node_filter_predicates(state, ctx, &alias, node)?;
    Ok(alias)
}

fn add_fixed_hop(
    state: &mut QueryState,
    ctx: &mut GenerationContext<'_>,
    prev_alias: &str,
    rel: &RelPattern<'_>,
    node: &NodePattern<'_>,
    join_kw: &str,
) -> Result<String, GenerationError> {
    let edge_alias = match rel.variable.and_then(|var| ctx.lookup(var).cloned()) {
        Some(Binding::Table { alias, kind: TableKind::Edge }) => alias,
        _ => bind_new_edge(state, ctx, join_kw, prev_alias, rel)?,
    };
    bind_hop_node(state, ctx, &edge_alias, rel.direction, node, join_kw)
}

fn bind_new_edge(
    state: &mut QueryState,
    ctx: &mut GenerationContext<'_>,
    join_kw: &str,
    prev_alias: &str,
    rel: &RelPattern<'_>,
) -> Result<String, GenerationError> {
    let alias = ctx.fresh_edge_alias();
    let condition = match rel.direction {
        Direction::Outgoing => format!("{alias}.source = {prev_alias}.uuid"),
        Direction::Incoming => format!("{alias}.target = {prev_alias}.uuid"),
        Direction::Either => format!("({alias}.source = {prev_alias}.uuid OR {alias}.target = {prev_alias}.uuid)"),
    };
    state.push_join(format!("{join_kw} edges {alias} ON {condition}"));
    add_tenant_predicate(state, &alias);
    if let Some(var) = rel.variable {
        ctx.bind_table(var, alias.clone(), TableKind::Edge);
    }
    add_edge_filter_predicates(state, ctx, &alias, rel)?;
    Ok(alias)
}

/// Compiles a variable-length relationship into a `WITH RECURSIVE` CTE
/// (`spec.md` §4.3.2) and joins nodes at both resulting endpoints.
fn add_variable_length_hop(
    state: &mut QueryState,
    ctx: &mut GenerationContext<'_>,
    prev_alias: &str,
    rel: &RelPattern<'_>,
    node: &NodePattern<'_>,
    join_kw: &str,
) -> Result<String, GenerationError> {
    let (min, max) = match rel.length {
        RelLength::Range { min, max } => (min, max),
        RelLength::Fixed => unreachable!("caller only invokes this for variable-length hops"),
    };
    let (phys_source, phys_target) = match rel.direction {
        Direction::Outgoing => ("source", "target"),
        Direction::Incoming => ("target", "source"),
        Direction::Either => {
            return Err(GenerationError::UnsupportedPatternShape(
                "undirected variable-length relationships are not supported",
            ))
        }
    };

    let cte_alias = ctx.fresh_cte_alias();
    let tenant = GenerationContext::TENANT_PARAM;
    crate::debug_print!(
        "compiling variable-length hop *{min}..{max:?} as recursive CTE {cte_alias}, direction {:?}",
        rel.direction
    );

    let base_type_filter = type_predicate_list(ctx, "", &rel.types)
        .map(|p| format!(" AND {p}"))
        .unwrap_or_default();
    let base = format!(
        "SELECT {phys_source} AS source, {phys_target} AS target, 1 AS depth, ARRAY[uuid] AS visited \
         FROM edges WHERE group_id = {tenant}{base_type_filter}"
    );

    let mut step_predicates = vec![
        format!("edges.group_id = {tenant}"),
        format!("NOT edges.uuid = ANY({cte_alias}.visited)"),
    ];
    if let Some(p) = type_predicate_list(ctx, "edges.", &rel.types) {
        step_predicates.push(p);
    }
    if let Some(max) = max {
        step_predicates.push(format!("{cte_alias}.depth < {max}"));
    }
    let step = format!(
        "SELECT {cte_alias}.source, edges.{phys_target}, {cte_alias}.depth + 1, {cte_alias}.visited || edges.uuid \
         FROM {cte_alias} JOIN edges ON {cte_alias}.target = edges.{phys_source} WHERE {}",
        step_predicates.join(" AND ")
    );

    state.ctes.push(format!("{cte_alias} AS ({base} UNION ALL {step})"));
    state.has_recursive_cte = true;

    state.push_join(format!("{join_kw} {cte_alias} ON {cte_alias}.source = {prev_alias}.uuid"));
    let depth_predicate = match max {
        Some(max) => format!("{cte_alias}.depth BETWEEN {min} AND {max}"),
        None => format!("{cte_alias}.depth >= {min}"),
    };
    state.push_predicate(depth_predicate);

    bind_hop_node(state, ctx, &cte_alias, Direction::Outgoing, node, join_kw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher_parser::ast::NodePattern;
    use std::collections::HashMap;

    #[test]
    fn single_node_pattern_produces_from() {
        let named = HashMap::new();
        let mut ctx = GenerationContext::new(&named, "g1");
        let mut state = QueryState::default();
        let node = NodePattern { variable: Some("n"), label: Some("Person"), properties: None };
        let pattern = Pattern::singleton(node);
        add_pattern(&mut state, &mut ctx, &pattern, "JOIN").unwrap();
        assert_eq!(state.from.as_deref(), Some("nodes n1"));
        assert!(state.predicates.iter().any(|p| p.contains("group_id")));
        assert!(state.predicates.iter().any(|p| p.contains("n1.type")));
    }

    #[test]
    fn reusing_a_bound_variable_does_not_add_a_new_from() {
        let named = HashMap::new();
        let mut ctx = GenerationContext::new(&named, "g1");
        ctx.bind_table("n", "n1".to_string(), TableKind::Node);
        let mut state = QueryState::default();
        let node = NodePattern { variable: Some("n"), label: Some("Person"), properties: None };
        let pattern = Pattern::singleton(node);
        add_pattern(&mut state, &mut ctx, &pattern, "JOIN").unwrap();
        assert!(state.from.is_none());
        assert!(state.joins.is_empty());
    }
}
