//! `RETURN`/`WITH` projection compilation (`spec.md` §4.3.4).
//!
//! `WITH` closes the current FROM/JOIN/WHERE scope into a CTE and rebinds
//! every projected name against the CTE's output columns
//! (`spec.md` §4.3.9); `RETURN` does the same but produces the final
//! `SELECT` instead of a CTE.

use std::collections::HashMap;

use crate::cypher_parser::ast::{Expression, OrderByItem, ProjectionItem, Return, With};

use super::context::{Binding, GenerationContext};
use super::errors::GenerationError;
use super::expr::render_expr;
use super::state::QueryState;

/// The result of rendering one projection's item list: SQL fragments ready
/// to join into a `SELECT` list, plus enough bookkeeping (`raw`, `names`) to
/// build `GROUP BY`, substitute aliases in `HAVING`/`ORDER BY`, and bind
/// output names for the next scope.
struct Projected {
    select_fragments: Vec<String>,
    /// `None` for a whole-variable `alias.*` entry, which has no single
    /// expression to substitute elsewhere.
    raw: Vec<Option<String>>,
    names: Vec<Option<String>>,
    aggregated: bool,
}

fn default_name(expr: &Expression<'_>, i: usize) -> String {
    match expr {
        Expression::Variable(v) => (*v).to_string(),
        Expression::PropertyAccess(access) => access.key.to_string(),
        _ => format!("col{}", i + 1),
    }
}

fn project(
    ctx: &mut GenerationContext<'_>,
    items: &[ProjectionItem<'_>],
    allow_whole_variable: bool,
) -> Result<Projected, GenerationError> {
    let aggregated = items.iter().any(|item| item.expression.contains_aggregate());
    let mut select_fragments = Vec::with_capacity(items.len());
    let mut raw = Vec::with_capacity(items.len());
    let mut names = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        if let Expression::Variable(v) = &item.expression {
            if let Some(Binding::Table { alias, .. }) = ctx.lookup(v).cloned() {
                if aggregated {
                    return Err(GenerationError::WholeVariableInAggregatingProjection { variable: (*v).to_string() });
                }
                if !allow_whole_variable {
                    return Err(GenerationError::UnsupportedPatternShape(
                        "WITH cannot project a whole variable; project its properties explicitly",
                    ));
                }
                select_fragments.push(format!("{alias}.*"));
                raw.push(None);
                names.push(None);
                continue;
            }
        }
        let sql = render_expr(ctx, &item.expression)?;
        let name = item.alias.map(|a| a.to_string()).unwrap_or_else(|| default_name(&item.expression, i));
        select_fragments.push(format!("{sql} AS {name}"));
        raw.push(Some(sql));
        names.push(Some(name));
    }

    Ok(Projected { select_fragments, raw, names, aggregated })
}

fn group_by_exprs(items: &[ProjectionItem<'_>], projected: &Projected) -> Vec<String> {
    if !projected.aggregated {
        return Vec::new();
    }
    items
        .iter()
        .zip(&projected.raw)
        .filter(|(item, _)| !item.expression.contains_aggregate())
        .filter_map(|(_, raw)| raw.clone())
        .collect()
}

/// Renders `ORDER BY`, substituting a bare name for the raw expression it
/// aliases when it matches one of the current projection's output names
/// (`spec.md` §4.3.4: "accepts aliases from the current projection").
fn render_order_by(
    ctx: &mut GenerationContext<'_>,
    items: &[OrderByItem<'_>],
    projected: &Projected,
) -> Result<String, GenerationError> {
    if items.is_empty() {
        return Ok(String::new());
    }
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        let sql = match &item.expression {
            Expression::Variable(v) => match projected.names.iter().position(|n| n.as_deref() == Some(*v)) {
                Some(pos) => {
                    let raw = projected.raw[pos].clone().unwrap_or_else(|| (*v).to_string());
                    crate::debug_print!("ORDER BY alias '{v}' substituted back to projected expression '{raw}'");
                    raw
                }
                None => render_expr(ctx, &item.expression)?,
            },
            _ => render_expr(ctx, &item.expression)?,
        };
        parts.push(if item.descending { format!("{sql} DESC") } else { sql });
    }
    Ok(format!(" ORDER BY {}", parts.join(", ")))
}

fn render_paging(skip: Option<i64>, limit: Option<i64>) -> String {
    let mut sql = String::new();
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(skip) = skip {
        sql.push_str(&format!(" OFFSET {skip}"));
    }
    sql
}

/// Compiles a `WITH` into a CTE, resets the clause-scope state, and rebinds
/// every projected name against the new CTE's output columns.
pub fn flush_to_cte(state: &mut QueryState, ctx: &mut GenerationContext<'_>, with: &With<'_>) -> Result<(), GenerationError> {
    let projected = project(ctx, &with.items, false)?;
    let group_by = group_by_exprs(&with.items, &projected);

    // The trailing WHERE filters the WITH's *output*. Postgres cannot see
    // SELECT-list aliases in WHERE/HAVING, so it is rendered against a
    // shadow scope mapping each output name straight to its underlying SQL
    // expression (`spec.md` §4.3.4: "substitute aliases back to their
    // underlying SQL expressions").
    let shadow: HashMap<String, Binding> = projected
        .names
        .iter()
        .zip(&projected.raw)
        .filter_map(|(name, raw)| match (name, raw) {
            (Some(n), Some(r)) => Some((n.clone(), Binding::Projected { column: r.clone() })),
            _ => None,
        })
        .collect();
    ctx.bindings = shadow;

    let filter_sql = with.where_.as_ref().map(|expr| render_expr(ctx, expr)).transpose()?;
    let order_by_sql = render_order_by(ctx, &with.order_by, &projected)?;
    let paging_sql = render_paging(with.skip, with.limit);

    let distinct = if with.distinct { "DISTINCT " } else { "" };
    let group_by_sql = if group_by.is_empty() { String::new() } else { format!(" GROUP BY {}", group_by.join(", ")) };

    let mut where_sql = state.where_clause();
    let having_sql = if projected.aggregated {
        crate::debug_print!("WITH is aggregating; routing its trailing filter to HAVING against the shadow scope");
        filter_sql.map(|f| format!(" HAVING {f}")).unwrap_or_default()
    } else {
        if let Some(f) = filter_sql {
            if where_sql.is_empty() {
                where_sql = format!(" WHERE {f}");
            } else {
                where_sql.push_str(" AND ");
                where_sql.push_str(&f);
            }
        }
        String::new()
    };

    let body = format!(
        "SELECT {distinct}{} {}{}{}{}{}{}",
        projected.select_fragments.join(", "),
        state.from_and_joins(),
        where_sql,
        group_by_sql,
        having_sql,
        order_by_sql,
        paging_sql,
    );

    let cte_alias = ctx.fresh_cte_alias();
    state.ctes.push(format!("{cte_alias} AS ({body})"));
    state.reset_scope();

    ctx.bindings = projected
        .names
        .into_iter()
        .zip(projected.raw)
        .filter_map(|(name, _)| name.map(|n| (n.clone(), Binding::Projected { column: format!("{cte_alias}.{n}") })))
        .collect();
    state.set_from(cte_alias);

    Ok(())
}

/// Compiles a terminal `RETURN` into the final `SELECT` body (without the
/// `WITH` preamble, which the caller prepends once for the whole query).
pub fn compile_final_select(
    state: &mut QueryState,
    ctx: &mut GenerationContext<'_>,
    ret: &Return<'_>,
) -> Result<String, GenerationError> {
    let projected = project(ctx, &ret.items, true)?;
    let group_by = group_by_exprs(&ret.items, &projected);
    let order_by_sql = render_order_by(ctx, &ret.order_by, &projected)?;
    let paging_sql = render_paging(ret.skip, ret.limit);

    let distinct = if ret.distinct { "DISTINCT " } else { "" };
    let group_by_sql = if group_by.is_empty() { String::new() } else { format!(" GROUP BY {}", group_by.join(", ")) };

    Ok(format!(
        "SELECT {distinct}{} {}{}{}{}{}",
        projected.select_fragments.join(", "),
        state.from_and_joins(),
        state.where_clause(),
        group_by_sql,
        order_by_sql,
        paging_sql,
    ))
}
