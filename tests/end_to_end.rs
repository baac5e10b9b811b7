//! End-to-end `parse` + `generate` scenarios: a `MATCH`/`RETURN` query, a
//! relationship hop, a variable-length path, a `WITH` aggregation boundary,
//! a `UNION`, and a `CREATE` terminated statement.

use std::collections::HashMap;

use cyphersql::{generate, parse};
use serde_json::{json, Value};

fn run(cypher: &str, named: &HashMap<String, Value>, tenant: &str) -> (String, Vec<Value>) {
    let _ = env_logger::try_init();
    let ast = parse(cypher).expect("query should parse");
    generate(&ast, named, tenant).expect("query should generate")
}

#[test]
fn scenario_single_label_filter() {
    let named = HashMap::new();
    let (sql, params) = run("MATCH (n:Person) WHERE n.age > 30 RETURN n.name", &named, "acme");

    assert!(sql.starts_with("SELECT n1.name AS name FROM nodes n1 WHERE"));
    assert!(sql.contains("n1.group_id = $1"));
    assert!(sql.contains("n1.type = $2"));
    assert!(sql.contains("(n1.properties->>'age')::numeric > $3"));
    assert_eq!(params[0], Value::String("acme".to_string()));
    assert_eq!(params[1], Value::String("Person".to_string()));
    assert_eq!(params[2], json!(30));
}

#[test]
fn scenario_relationship_hop_with_type_filter() {
    let named = HashMap::new();
    let (sql, params) = run(
        "MATCH (a:Person)-[:KNOWS]->(b:Person) WHERE a.name = 'Alice' RETURN a.name, b.name",
        &named,
        "acme",
    );

    assert!(sql.contains("FROM nodes n1"));
    assert!(sql.contains("JOIN edges e1 ON e1.source = n1.uuid"));
    assert!(sql.contains("JOIN nodes n2 ON e1.target = n2.uuid"));
    assert!(sql.contains("e1.relation_type = $"));
    assert!(sql.contains("SELECT n1.name AS name, n2.name AS name"));
    assert_eq!(params[0], Value::String("acme".to_string()));
}

#[test]
fn scenario_variable_length_path_with_bounds() {
    let named = HashMap::new();
    let (sql, _) = run(
        "MATCH (a:Person)-[:KNOWS*1..3]->(b:Person) RETURN a.name, b.name",
        &named,
        "acme",
    );

    assert!(sql.starts_with("WITH RECURSIVE cte_1 AS ("));
    assert!(sql.contains("ARRAY[uuid] AS visited"));
    assert!(sql.contains("UNION ALL"));
    assert!(sql.contains("NOT edges.uuid = ANY(cte_1.visited)"));
    assert!(sql.contains("cte_1.depth BETWEEN 1 AND 3"));
    assert!(sql.contains("JOIN cte_1 ON cte_1.source = n1.uuid"));
}

#[test]
fn scenario_unbounded_variable_length_path() {
    let named = HashMap::new();
    let (sql, _) = run("MATCH (a:Person)-[:KNOWS*2..]->(b:Person) RETURN a.name", &named, "acme");
    assert!(sql.contains("cte_1.depth >= 2"));
    assert!(!sql.contains("depth <"));
}

#[test]
fn scenario_with_aggregation_then_filtered_return() {
    let named = HashMap::new();
    let (sql, params) = run(
        "MATCH (p:Person)-[:LIVES_IN]->(c:City) \
         WITH c.name AS city, COUNT(p) AS population \
         WHERE population > 1000 \
         RETURN city, population ORDER BY population DESC LIMIT 10",
        &named,
        "acme",
    );

    assert!(sql.starts_with("WITH cte_1 AS (SELECT"));
    assert!(sql.contains("GROUP BY n2.name"));
    assert!(sql.contains("HAVING (COUNT(n1.uuid) > $"));
    assert!(sql.contains("SELECT cte_1.city AS city, cte_1.population AS population FROM cte_1"));
    assert!(sql.contains("ORDER BY cte_1.population DESC"));
    assert!(sql.contains("LIMIT 10"));
    assert_eq!(params[0], Value::String("acme".to_string()));
}

#[test]
fn scenario_union_of_two_node_labels() {
    let named = HashMap::new();
    let (sql, params) = run(
        "MATCH (n:Person) RETURN n.name AS label UNION MATCH (m:City) RETURN m.name AS label",
        &named,
        "acme",
    );
    let union_count = sql.matches(" UNION ").count();
    assert_eq!(union_count, 1);
    assert!(!sql.contains("UNION ALL"));
    assert_eq!(params[0], Value::String("acme".to_string()));
}

#[test]
fn scenario_union_all_keeps_duplicates() {
    let named = HashMap::new();
    let (sql, _) = run(
        "MATCH (n:Person) RETURN n.name AS label UNION ALL MATCH (m:City) RETURN m.name AS label",
        &named,
        "acme",
    );
    assert!(sql.contains("UNION ALL"));
}

#[test]
fn scenario_create_node_with_properties() {
    let named = HashMap::new();
    let (sql, params) = run("CREATE (n:Person {name: 'Alice', age: 30})", &named, "acme");
    assert!(sql.starts_with("INSERT INTO nodes (uuid, type, group_id, properties) VALUES"));
    assert_eq!(params[0], Value::String("acme".to_string()));
    assert!(params.iter().any(|p| *p == json!({"name": "Alice", "age": 30})));
}

#[test]
fn scenario_match_then_create_relationship() {
    let named = HashMap::new();
    let (sql, _) = run(
        "MATCH (a:Person {name: 'Alice'}), (b:Person {name: 'Bob'}) CREATE (a)-[:KNOWS {since: 2020}]->(b)",
        &named,
        "acme",
    );
    assert!(sql.contains("INSERT INTO edges (uuid, source, target, relation_type, group_id, properties) SELECT"));
    assert!(sql.contains("n1.uuid, n2.uuid"));
    assert!(sql.contains("FROM nodes n1"));
    assert!(sql.contains("CROSS JOIN nodes n2"));
}

#[test]
fn scenario_merge_node_with_on_create_set() {
    let named = HashMap::new();
    let cypher = "MERGE (n:Person {name: 'Alice'}) ON CREATE SET n.created = true";
    let (sql, _) = run(cypher, &named, "acme");
    assert!(sql.starts_with("INSERT INTO nodes (uuid, type, group_id, properties) VALUES"));
    assert!(sql.contains("ON CONFLICT (group_id, type, name)"));
    assert!(sql.contains("jsonb_set("));
}

#[test]
fn scenario_named_parameter_binding() {
    let mut named = HashMap::new();
    named.insert("min_age".to_string(), json!(21));
    let (sql, params) = run("MATCH (n:Person) WHERE n.age > $min_age RETURN n.name", &named, "acme");
    assert!(sql.contains("(n1.properties->>'age')::numeric > $3"));
    assert_eq!(params[2], json!(21));
}
