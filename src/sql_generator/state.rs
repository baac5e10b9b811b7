//! Accumulated FROM/JOIN/WHERE fragments for the clause scope currently
//! being built.
//!
//! Mirrors `spec.md` §4.3.9's "state across clauses": (a) bound aliases
//! live in [`super::context::GenerationContext::bindings`], (b) FROM/JOIN
//! fragments live here as `from`/`joins`, (c) accumulated predicates live
//! here as `predicates`. A `WITH` boundary flushes all three (see
//! `projection::flush_to_cte`) and this struct is reset to empty.

#[derive(Debug, Default)]
pub struct QueryState {
    pub from: Option<String>,
    pub joins: Vec<String>,
    pub predicates: Vec<String>,
    /// Completed `name AS (...)` CTE definitions, in emission order. These
    /// accumulate across the whole query body (never reset by a flush) so
    /// the final `WITH ...` preamble can name every one of them.
    pub ctes: Vec<String>,
    /// Set once a variable-length path CTE is emitted; upgrades the
    /// preamble from `WITH` to `WITH RECURSIVE` for every CTE in the list
    /// (Postgres requires a single `RECURSIVE` keyword covering the whole
    /// `WITH` clause, not one per CTE).
    pub has_recursive_cte: bool,
}

impl QueryState {
    pub fn set_from(&mut self, fragment: String) {
        if self.from.is_none() {
            self.from = Some(fragment);
        }
    }

    pub fn push_join(&mut self, fragment: String) {
        self.joins.push(fragment);
    }

    pub fn push_predicate(&mut self, predicate: String) {
        self.predicates.push(predicate);
    }

    pub fn from_and_joins(&self) -> String {
        let mut sql = format!("FROM {}", self.from.as_deref().unwrap_or(""));
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        sql
    }

    pub fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }

    pub fn reset_scope(&mut self) {
        self.from = None;
        self.joins.clear();
        self.predicates.clear();
    }

    pub fn with_preamble(&self) -> String {
        if self.ctes.is_empty() {
            String::new()
        } else {
            let keyword = if self.has_recursive_cte { "WITH RECURSIVE" } else { "WITH" };
            format!("{keyword} {} ", self.ctes.join(", "))
        }
    }
}
