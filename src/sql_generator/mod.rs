//! AST → SQL lowering (`spec.md` §4.3). The entry point is [`generate`];
//! everything else in this module is the per-clause machinery it drives.

use std::collections::HashMap;

use serde_json::Value;

use crate::cypher_parser::ast::{Clause, CypherAst, Query, UnionType};

pub mod context;
pub mod errors;
pub mod expr;
pub mod pattern;
pub mod projection;
pub mod state;
pub mod write;

use context::GenerationContext;
use errors::GenerationError;
use state::QueryState;

/// Lower a parsed statement into parameterised SQL (`spec.md` §6).
///
/// All branches of a `UNION` share one [`GenerationContext`], so positional
/// parameters stay contiguous across the whole statement; each branch still
/// gets its own clean variable scope (`spec.md` §4.3.9 applies per query
/// body, not per statement).
pub fn generate(
    ast: &CypherAst<'_>,
    named_params: &HashMap<String, Value>,
    tenant_id: &str,
) -> Result<(String, Vec<Value>), GenerationError> {
    let mut ctx = GenerationContext::new(named_params, tenant_id);

    let (mut sql, first_shape) = generate_query(&mut ctx, &ast.first)?;
    for (union_type, query) in &ast.rest {
        ctx.bindings.clear();
        let (branch_sql, branch_shape) = generate_query(&mut ctx, query)?;
        if branch_shape != first_shape {
            return Err(GenerationError::MismatchedUnionShape { left: first_shape, right: branch_shape });
        }
        let keyword = match union_type {
            UnionType::Distinct => "UNION",
            UnionType::All => "UNION ALL",
        };
        sql = format!("{sql} {keyword} {branch_sql}");
    }

    Ok((sql, ctx.into_params()))
}

/// Walks one query body's clause list once, per `spec.md` §4.3.9: `MATCH`
/// extends the live FROM/JOIN/WHERE state, `WITH` flushes it into a CTE and
/// opens a new scope, and `RETURN` or a single run of writing clauses
/// terminates the body. Returns the compiled SQL and, for a `RETURN`
/// terminus, its projected column count (used to validate `UNION` shape).
fn generate_query(ctx: &mut GenerationContext<'_>, query: &Query<'_>) -> Result<(String, usize), GenerationError> {
    let mut state = QueryState::default();
    let mut write_statements = Vec::new();
    let mut terminal: Option<(String, usize)> = None;

    for clause in &query.clauses {
        match clause {
            Clause::Match(m) => pattern::add_match(&mut state, ctx, m)?,
            Clause::With(w) => projection::flush_to_cte(&mut state, ctx, w)?,
            Clause::Return(r) => {
                let select = projection::compile_final_select(&mut state, ctx, r)?;
                terminal = Some((format!("{}{select}", state.with_preamble()), r.items.len()));
            }
            Clause::Create(c) => write_statements.push(write::compile_create(ctx, &state, c)?),
            Clause::Merge(m) => write_statements.push(write::compile_merge(ctx, m)?),
            Clause::Delete(d) => write_statements.push(write::compile_delete(ctx, &state, d)?),
            Clause::Set(s) => write_statements.push(write::compile_set(ctx, &state, s)?),
            Clause::Remove(r) => write_statements.push(write::compile_remove(ctx, &state, r)?),
        }
    }

    if let Some(terminal) = terminal {
        return Ok(terminal);
    }
    if !write_statements.is_empty() {
        return Ok((format!("{}{}", state.with_preamble(), write_statements.join("; ")), 0));
    }
    Err(GenerationError::MissingTerminalClause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher_parser::parse;

    fn generate_sql(cypher: &str, named: &HashMap<String, Value>, tenant: &str) -> (String, Vec<Value>) {
        let ast = parse(cypher).unwrap();
        generate(&ast, named, tenant).unwrap()
    }

    #[test]
    fn simple_match_return_binds_tenant_first() {
        let named = HashMap::new();
        let (sql, params) = generate_sql("MATCH (n:Person) RETURN n.name", &named, "tenant-1");
        assert_eq!(sql, "SELECT n1.name AS name FROM nodes n1 WHERE n1.group_id = $1 AND n1.type = $2");
        assert_eq!(params, vec![Value::String("tenant-1".to_string()), Value::String("Person".to_string())]);
    }

    #[test]
    fn relationship_hop_joins_edges_and_nodes() {
        let named = HashMap::new();
        let (sql, _) = generate_sql(
            "MATCH (a:Person)-[r:KNOWS]->(b:Person) RETURN a.name, b.name",
            &named,
            "t1",
        );
        assert!(sql.contains("FROM nodes n1"));
        assert!(sql.contains("JOIN edges e1 ON e1.source = n1.uuid"));
        assert!(sql.contains("JOIN nodes n2 ON e1.target = n2.uuid"));
        assert!(sql.contains("e1.relation_type = $2"));
    }

    #[test]
    fn variable_length_path_compiles_to_recursive_cte() {
        let named = HashMap::new();
        let (sql, _) = generate_sql(
            "MATCH (a:Person)-[:KNOWS*1..3]->(b:Person) RETURN a.name, b.name",
            &named,
            "t1",
        );
        assert!(sql.starts_with("WITH RECURSIVE cte_1 AS ("));
        assert!(sql.contains("UNION ALL"));
        assert!(sql.contains("cte_1.depth BETWEEN 1 AND 3"));
    }

    #[test]
    fn with_boundary_compiles_aggregation_then_final_select() {
        let named = HashMap::new();
        let (sql, _) = generate_sql(
            "MATCH (p:Person)-[:LIVES_IN]->(c:City) WITH c.name AS city, COUNT(p) AS population WHERE population > 1000 RETURN city, population ORDER BY population DESC",
            &named,
            "t1",
        );
        assert!(sql.starts_with("WITH cte_1 AS (SELECT"));
        assert!(sql.contains("GROUP BY n2.name"));
        assert!(sql.contains("HAVING (COUNT(n1.uuid) > $"));
        assert!(sql.contains("SELECT cte_1.city AS city, cte_1.population AS population FROM cte_1"));
        assert!(sql.contains("ORDER BY cte_1.population DESC"));
    }

    #[test]
    fn union_requires_matching_projection_shape() {
        let named = HashMap::new();
        let ast = parse("MATCH (n:Person) RETURN n.name UNION MATCH (m:City) RETURN m.name, m.uuid").unwrap();
        let err = generate(&ast, &named, "t1").unwrap_err();
        assert!(matches!(err, GenerationError::MismatchedUnionShape { left: 1, right: 2 }));
    }

    #[test]
    fn create_without_preceding_clauses_is_a_terminal_write() {
        let named = HashMap::new();
        let (sql, _) = generate_sql("CREATE (n:Person {name: 'Alice'})", &named, "t1");
        assert!(sql.starts_with("INSERT INTO nodes"));
    }

    #[test]
    fn query_without_terminal_clause_errors() {
        let named = HashMap::new();
        let ast = parse("MATCH (n:Person)").unwrap();
        let err = generate(&ast, &named, "t1").unwrap_err();
        assert_eq!(err, GenerationError::MissingTerminalClause);
    }
}
