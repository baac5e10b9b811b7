//! Universal invariants that must hold across every generated statement,
//! independent of any one scenario's shape: tenant isolation, positional
//! parameter contiguity, deterministic output, and rejection of grammar
//! this crate does not implement.

use std::collections::HashMap;

use cyphersql::{generate, parse, GenerationError};
use serde_json::{json, Value};

fn run(cypher: &str, named: &HashMap<String, Value>, tenant: &str) -> (String, Vec<Value>) {
    let _ = env_logger::try_init();
    let ast = parse(cypher).expect("query should parse");
    generate(&ast, named, tenant).expect("query should generate")
}

#[test]
fn tenant_id_is_always_parameter_one() {
    let named = HashMap::new();
    let (_, params) = run("MATCH (n:Person) RETURN n.name", &named, "tenant-42");
    assert_eq!(params[0], Value::String("tenant-42".to_string()));
}

#[test]
fn every_table_reference_is_tenant_scoped() {
    let named = HashMap::new();
    let (sql, _) = run(
        "MATCH (a:Person)-[:KNOWS]->(b:Person) RETURN a.name, b.name",
        &named,
        "t1",
    );
    // Node aliases n1, n2 and edge alias e1 must each carry a group_id predicate.
    for alias in ["n1", "n2", "e1"] {
        assert!(
            sql.contains(&format!("{alias}.group_id = $1")),
            "missing tenant predicate for {alias} in: {sql}"
        );
    }
}

#[test]
fn positional_parameters_are_contiguous_and_match_occurrence_order() {
    let named = HashMap::new();
    let (sql, params) = run(
        "MATCH (n:Person) WHERE n.age > 18 AND n.age < 65 RETURN n.name",
        &named,
        "t1",
    );
    // $1 = tenant, $2 = label, $3 = 18, $4 = 65, in left-to-right source order.
    assert!(sql.contains("$1"));
    assert!(sql.contains("$4"));
    assert_eq!(params.len(), 4);
    assert_eq!(params[2], json!(18));
    assert_eq!(params[3], json!(65));
}

#[test]
fn generation_is_deterministic_across_repeated_calls() {
    let named = HashMap::new();
    let cypher = "MATCH (a:Person)-[:KNOWS*1..3]->(b:Person) WHERE a.name = 'Alice' RETURN a.name, b.name";
    let (sql1, params1) = run(cypher, &named, "t1");
    let (sql2, params2) = run(cypher, &named, "t1");
    assert_eq!(sql1, sql2);
    assert_eq!(params1, params2);
}

#[test]
fn repeated_literal_type_occurrences_each_bind_their_own_parameter() {
    let named = HashMap::new();
    let (_, params) = run(
        "MATCH (a:Person)-[:KNOWS|FOLLOWS]->(b:Person) RETURN a.name",
        &named,
        "t1",
    );
    // tenant + label + two relationship-type literals.
    assert_eq!(params.len(), 4);
    assert_eq!(params[2], Value::String("KNOWS".to_string()));
    assert_eq!(params[3], Value::String("FOLLOWS".to_string()));
}

#[test]
fn unbound_variable_reference_is_rejected() {
    let named = HashMap::new();
    let ast = parse("MATCH (n:Person) RETURN m.name").unwrap();
    let err = generate(&ast, &named, "t1").unwrap_err();
    assert!(matches!(err, GenerationError::UnboundVariable { .. }));
}

#[test]
fn missing_named_parameter_is_rejected() {
    let named = HashMap::new();
    let ast = parse("MATCH (n:Person) WHERE n.age > $min_age RETURN n.name").unwrap();
    let err = generate(&ast, &named, "t1").unwrap_err();
    assert!(matches!(err, GenerationError::UnboundParameter(p) if p == "min_age"));
}

#[test]
fn query_with_no_return_and_no_write_clause_is_rejected() {
    let named = HashMap::new();
    let ast = parse("MATCH (n:Person)").unwrap();
    let err = generate(&ast, &named, "t1").unwrap_err();
    assert_eq!(err, GenerationError::MissingTerminalClause);
}

#[test]
fn mismatched_union_projection_width_is_rejected() {
    let named = HashMap::new();
    let ast = parse("MATCH (n:Person) RETURN n.name UNION MATCH (m:City) RETURN m.name, m.uuid").unwrap();
    let err = generate(&ast, &named, "t1").unwrap_err();
    assert!(matches!(err, GenerationError::MismatchedUnionShape { left: 1, right: 2 }));
}

#[test]
fn unwind_has_no_grammar_production() {
    assert!(parse("UNWIND [1, 2, 3] AS x RETURN x").is_err());
}

#[test]
fn list_comprehension_has_no_grammar_production() {
    assert!(parse("MATCH (n:Person) RETURN [x IN n.tags WHERE x = 'a']").is_err());
}

#[test]
fn call_subquery_has_no_grammar_production() {
    assert!(parse("CALL { MATCH (n:Person) RETURN n } RETURN n").is_err());
}

#[test]
fn shortest_path_has_no_grammar_production() {
    assert!(parse("MATCH p = shortestPath((a:Person)-[*]-(b:Person)) RETURN p").is_err());
}

#[test]
fn variable_length_mixed_with_fixed_hop_is_rejected() {
    let named = HashMap::new();
    let ast = parse("MATCH (a:Person)-[:KNOWS]->(b:Person)-[:FOLLOWS*1..3]->(c:Person) RETURN a.name").unwrap();
    let err = generate(&ast, &named, "t1").unwrap_err();
    assert!(matches!(err, GenerationError::UnsupportedPatternShape(_)));
}

#[test]
fn undirected_variable_length_relationship_is_rejected() {
    let named = HashMap::new();
    let ast = parse("MATCH (a:Person)-[:KNOWS*1..3]-(b:Person) RETURN a.name").unwrap();
    let err = generate(&ast, &named, "t1").unwrap_err();
    assert!(matches!(err, GenerationError::UnsupportedPatternShape(_)));
}

#[test]
fn merge_of_relationship_pattern_is_rejected() {
    let named = HashMap::new();
    let ast = parse("MATCH (a:Person), (b:Person) MERGE (a)-[:KNOWS]->(b)").unwrap();
    let err = generate(&ast, &named, "t1").unwrap_err();
    assert!(matches!(err, GenerationError::UnsupportedPatternShape(_)));
}

#[test]
fn detach_delete_on_a_relationship_variable_is_rejected() {
    let named = HashMap::new();
    let ast = parse("MATCH (a:Person)-[r:KNOWS]->(b:Person) DETACH DELETE r").unwrap();
    let err = generate(&ast, &named, "t1").unwrap_err();
    assert!(matches!(err, GenerationError::InvalidWriteTarget("DETACH DELETE", _)));
}
