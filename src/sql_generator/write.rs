//! `CREATE`/`MERGE`/`DELETE`/`SET`/`REMOVE` compilation (`spec.md` §4.3.6).
//!
//! Each of these clauses is compiled as the sole terminal action of a query
//! body (no combining a write with a subsequent `RETURN` into one
//! statement); a pattern with more than one write action, or a write
//! referencing more than one table, produces `;`-joined statements.

use serde_json::Value;
use uuid::Uuid;

use crate::cypher_parser::ast::{
    Create, Delete, Direction, Expression, Merge, NodePattern, Pattern, PropertyKV, RelPattern, Remove, Set,
};
use crate::schema::TableKind;

use super::context::{Binding, GenerationContext};
use super::errors::GenerationError;
use super::expr::{literal_to_json, render_expr};
use super::state::QueryState;

fn properties_to_json(props: Option<&[PropertyKV<'_>]>) -> Result<Value, GenerationError> {
    let mut map = serde_json::Map::new();
    if let Some(props) = props {
        for kv in props {
            match &kv.value {
                Expression::Literal(lit) => {
                    map.insert(kv.key.to_string(), literal_to_json(lit));
                }
                _ => {
                    return Err(GenerationError::UnsupportedPatternShape(
                        "CREATE/MERGE property maps must contain only literal values",
                    ))
                }
            }
        }
    }
    Ok(Value::Object(map))
}

fn endpoint_alias(ctx: &GenerationContext<'_>, node: &NodePattern<'_>) -> Result<String, GenerationError> {
    let var = node.variable.ok_or(GenerationError::UnboundRelationshipEndpoint)?;
    match ctx.lookup(var) {
        Some(Binding::Table { alias, kind: TableKind::Node }) => Ok(alias.clone()),
        _ => Err(GenerationError::UnboundRelationshipEndpoint),
    }
}

pub fn compile_create(ctx: &mut GenerationContext<'_>, state: &QueryState, create: &Create<'_>) -> Result<String, GenerationError> {
    let mut statements = Vec::with_capacity(create.patterns.len());
    for pattern in &create.patterns {
        statements.push(create_pattern(ctx, state, pattern)?);
    }
    Ok(statements.join("; "))
}

fn create_pattern(ctx: &mut GenerationContext<'_>, state: &QueryState, pattern: &Pattern<'_>) -> Result<String, GenerationError> {
    if pattern.hops.is_empty() {
        return create_node_statement(ctx, &pattern.start);
    }
    let mut statements = Vec::new();
    let mut prev_alias = endpoint_alias(ctx, &pattern.start)?;
    for (rel, node) in &pattern.hops {
        let next_alias = endpoint_alias(ctx, node)?;
        statements.push(create_edge_statement(ctx, state, &prev_alias, rel, &next_alias)?);
        prev_alias = next_alias;
    }
    Ok(statements.join("; "))
}

fn create_node_statement(ctx: &mut GenerationContext<'_>, node: &NodePattern<'_>) -> Result<String, GenerationError> {
    let uuid_param = ctx.bind_value(Value::String(Uuid::new_v4().to_string()));
    let type_param = match node.label {
        Some(label) => ctx.bind_value(Value::String(label.to_string())),
        None => ctx.bind_value(Value::Null),
    };
    let props_param = ctx.bind_value(properties_to_json(node.properties.as_deref())?);
    Ok(format!(
        "INSERT INTO nodes (uuid, type, group_id, properties) VALUES ({uuid_param}, {type_param}, {}, {props_param})",
        GenerationContext::TENANT_PARAM,
    ))
}

fn create_edge_statement(
    ctx: &mut GenerationContext<'_>,
    state: &QueryState,
    source_alias: &str,
    rel: &RelPattern<'_>,
    target_alias: &str,
) -> Result<String, GenerationError> {
    let uuid_param = ctx.bind_value(Value::String(Uuid::new_v4().to_string()));
    let type_value = rel.types.first().copied().unwrap_or("RELATED_TO");
    let type_param = ctx.bind_value(Value::String(type_value.to_string()));
    let props_param = ctx.bind_value(properties_to_json(rel.properties.as_deref())?);
    let (src, tgt) = match rel.direction {
        Direction::Incoming => (target_alias, source_alias),
        Direction::Outgoing | Direction::Either => (source_alias, target_alias),
    };
    Ok(format!(
        "INSERT INTO edges (uuid, source, target, relation_type, group_id, properties) SELECT {uuid_param}, {src}.uuid, {tgt}.uuid, {type_param}, {}, {props_param} {}{}",
        GenerationContext::TENANT_PARAM,
        state.from_and_joins(),
        state.where_clause(),
    ))
}

/// `MERGE` of a relationship pattern is out of scope: match the two
/// endpoint nodes with `MERGE`, then `CREATE` the relationship between them.
pub fn compile_merge(ctx: &mut GenerationContext<'_>, merge: &Merge<'_>) -> Result<String, GenerationError> {
    if !merge.pattern.hops.is_empty() {
        return Err(GenerationError::UnsupportedPatternShape(
            "MERGE of a relationship pattern is not supported; MERGE the endpoint nodes, then CREATE the relationship",
        ));
    }
    let node = &merge.pattern.start;
    let key_props = node
        .properties
        .as_deref()
        .filter(|props| !props.is_empty())
        .ok_or(GenerationError::MergeWithoutKey)?;
    let var = node.variable.unwrap_or("");

    for item in merge.on_match.iter().chain(merge.on_create.iter()) {
        if item.target.base != var {
            return Err(GenerationError::InvalidWriteTarget("MERGE SET", item.target.base.to_string()));
        }
    }

    let mut conflict_exprs = vec!["group_id".to_string(), TableKind::Node.type_column().to_string()];
    for kv in key_props {
        if TableKind::Node.known_columns().contains(kv.key) {
            conflict_exprs.push(kv.key.to_string());
        } else {
            conflict_exprs.push(format!("(properties->>'{}')", kv.key));
        }
    }

    let uuid_param = ctx.bind_value(Value::String(Uuid::new_v4().to_string()));
    let type_param = match node.label {
        Some(label) => ctx.bind_value(Value::String(label.to_string())),
        None => ctx.bind_value(Value::Null),
    };
    let props_param = ctx.bind_value(properties_to_json(Some(key_props))?);

    let mut insert_props_sql = props_param;
    for item in &merge.on_create {
        let value_sql = render_expr(ctx, &item.value)?;
        insert_props_sql = format!("jsonb_set({insert_props_sql}, '{{{}}}', to_jsonb({value_sql}))", item.target.key);
    }

    let do_update = if merge.on_match.is_empty() {
        "DO NOTHING".to_string()
    } else {
        let mut update_props_sql = "nodes.properties".to_string();
        for item in &merge.on_match {
            let value_sql = render_expr(ctx, &item.value)?;
            update_props_sql = format!("jsonb_set({update_props_sql}, '{{{}}}', to_jsonb({value_sql}))", item.target.key);
        }
        format!("DO UPDATE SET properties = {update_props_sql}")
    };

    Ok(format!(
        "INSERT INTO nodes (uuid, type, group_id, properties) VALUES ({uuid_param}, {type_param}, {}, {insert_props_sql}) ON CONFLICT ({}) {do_update}",
        GenerationContext::TENANT_PARAM,
        conflict_exprs.join(", "),
    ))
}

pub fn compile_delete(ctx: &GenerationContext<'_>, state: &QueryState, delete: &Delete<'_>) -> Result<String, GenerationError> {
    let mut statements = Vec::with_capacity(delete.items.len());
    for expr in &delete.items {
        let var = match expr {
            Expression::Variable(v) => *v,
            _ => return Err(GenerationError::UnsupportedPatternShape("DELETE targets must be bare variables")),
        };
        let (alias, kind) = ctx.require_table(var, "DELETE")?;
        let selector = format!("SELECT {alias}.uuid {}{}", state.from_and_joins(), state.where_clause());
        if delete.detach {
            if kind != TableKind::Node {
                return Err(GenerationError::InvalidWriteTarget("DETACH DELETE", var.to_string()));
            }
            statements.push(format!("DELETE FROM edges WHERE source IN ({selector}) OR target IN ({selector})"));
        }
        statements.push(format!("DELETE FROM {} WHERE uuid IN ({selector})", kind.table_name()));
    }
    Ok(statements.join("; "))
}

pub fn compile_set(ctx: &mut GenerationContext<'_>, state: &QueryState, set: &Set<'_>) -> Result<String, GenerationError> {
    let mut by_var: Vec<(&str, Vec<&crate::cypher_parser::ast::SetItem<'_>>)> = Vec::new();
    for item in &set.items {
        match by_var.iter_mut().find(|(v, _)| *v == item.target.base) {
            Some(entry) => entry.1.push(item),
            None => by_var.push((item.target.base, vec![item])),
        }
    }

    let mut statements = Vec::with_capacity(by_var.len());
    for (var, items) in by_var {
        let (alias, kind) = ctx.require_table(var, "SET").map(|(alias, kind)| (alias.to_string(), kind))?;
        let selector = format!("SELECT {alias}.uuid {}{}", state.from_and_joins(), state.where_clause());

        let mut assignments = Vec::new();
        let mut props_expr: Option<String> = None;
        for item in items {
            let value_sql = render_expr(ctx, &item.value)?;
            if kind.known_columns().contains(item.target.key) {
                assignments.push(format!("{} = {value_sql}", item.target.key));
            } else {
                let base = props_expr.take().unwrap_or_else(|| "properties".to_string());
                props_expr = Some(format!("jsonb_set({base}, '{{{}}}', to_jsonb({value_sql}))", item.target.key));
            }
        }
        if let Some(expr) = props_expr {
            assignments.push(format!("properties = {expr}"));
        }

        statements.push(format!(
            "UPDATE {} SET {} WHERE uuid IN ({selector})",
            kind.table_name(),
            assignments.join(", "),
        ));
    }
    Ok(statements.join("; "))
}

pub fn compile_remove(ctx: &GenerationContext<'_>, state: &QueryState, remove: &Remove<'_>) -> Result<String, GenerationError> {
    let mut by_var: Vec<(&str, Vec<&str>)> = Vec::new();
    for item in &remove.items {
        match by_var.iter_mut().find(|(v, _)| *v == item.base) {
            Some(entry) => entry.1.push(item.key),
            None => by_var.push((item.base, vec![item.key])),
        }
    }

    let mut statements = Vec::with_capacity(by_var.len());
    for (var, keys) in by_var {
        let (alias, kind) = ctx.require_table(var, "REMOVE")?;
        let selector = format!("SELECT {alias}.uuid {}{}", state.from_and_joins(), state.where_clause());
        let mut props_expr = "properties".to_string();
        for key in &keys {
            props_expr = format!("{props_expr} #- '{{{key}}}'");
        }
        statements.push(format!("UPDATE {} SET properties = {props_expr} WHERE uuid IN ({selector})", kind.table_name()));
    }
    Ok(statements.join("; "))
}
