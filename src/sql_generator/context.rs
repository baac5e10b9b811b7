//! Generation-time state: alias counters, the positional parameter
//! accumulator, named-parameter interning, and the table of currently bound
//! variables.
//!
//! Grounded on `spec.md` §3's "Generation-time state" table and the
//! teacher's convention (`clickhouse_query_generator/context.rs`) of
//! threading one mutable context by `&mut` through the whole visitor rather
//! than scattering counters as free functions or globals.

use std::collections::HashMap;

use serde_json::Value;

use super::errors::GenerationError;
use crate::schema::TableKind;

/// A variable bound to a concrete table alias by a preceding `MATCH` or
/// `CREATE`. Once a `WITH` flushes the current scope into a CTE, bound
/// variables are replaced by [`Binding::Projected`] entries that resolve to
/// a column on the CTE rather than a joinable table.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Table { alias: String, kind: TableKind },
    /// Bound to an output column of the most recently flushed CTE.
    Projected { column: String },
}

#[derive(Debug)]
pub struct GenerationContext<'p> {
    named_params: &'p HashMap<String, Value>,
    params: Vec<Value>,
    named_param_index: HashMap<String, usize>,
    node_counter: u32,
    edge_counter: u32,
    cte_counter: u32,
    pub bindings: HashMap<String, Binding>,
}

impl<'p> GenerationContext<'p> {
    /// The tenant id is bound eagerly as `$1` (`spec.md` §4.3.7: "it always
    /// occupies index 1 when present"), before any other parameter.
    pub fn new(named_params: &'p HashMap<String, Value>, tenant_id: &str) -> Self {
        let mut ctx = GenerationContext {
            named_params,
            params: Vec::new(),
            named_param_index: HashMap::new(),
            node_counter: 0,
            edge_counter: 0,
            cte_counter: 0,
            bindings: HashMap::new(),
        };
        ctx.params.push(Value::String(tenant_id.to_string()));
        ctx
    }

    pub const TENANT_PARAM: &'static str = "$1";

    pub fn bind_value(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    pub fn bind_named(&mut self, name: &str) -> Result<String, GenerationError> {
        if let Some(&idx) = self.named_param_index.get(name) {
            return Ok(format!("${idx}"));
        }
        let value = self
            .named_params
            .get(name)
            .cloned()
            .ok_or_else(|| GenerationError::UnboundParameter(name.to_string()))?;
        self.params.push(value);
        let idx = self.params.len();
        self.named_param_index.insert(name.to_string(), idx);
        Ok(format!("${idx}"))
    }

    /// The JSON value bound to `$name`, used to infer a SQL cast when a
    /// property-access comparison's right-hand side is a parameter
    /// (`spec.md` §4.3.5).
    pub fn named_param_value(&self, name: &str) -> Option<&Value> {
        self.named_params.get(name)
    }

    pub fn fresh_node_alias(&mut self) -> String {
        self.node_counter += 1;
        format!("n{}", self.node_counter)
    }

    pub fn fresh_edge_alias(&mut self) -> String {
        self.edge_counter += 1;
        format!("e{}", self.edge_counter)
    }

    pub fn fresh_cte_alias(&mut self) -> String {
        self.cte_counter += 1;
        format!("cte_{}", self.cte_counter)
    }

    pub fn bind_table(&mut self, variable: &str, alias: String, kind: TableKind) {
        self.bindings.insert(
            variable.to_string(),
            Binding::Table { alias, kind },
        );
    }

    pub fn lookup(&self, variable: &str) -> Option<&Binding> {
        self.bindings.get(variable)
    }

    pub fn require_table(&self, variable: &str, context: &'static str) -> Result<(&str, TableKind), GenerationError> {
        match self.bindings.get(variable) {
            Some(Binding::Table { alias, kind }) => Ok((alias.as_str(), *kind)),
            _ => Err(GenerationError::UnboundVariable {
                variable: variable.to_string(),
                context,
            }),
        }
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }
}
