//! The fixed two-table property-graph schema this crate targets.
//!
//! Unlike the teacher crate's `graph_catalog`, which discovers and validates
//! schema against a live database, this schema is fixed by `spec.md` §6 and
//! never introspected — schema DDL is explicitly out of scope (§1).

use lazy_static::lazy_static;
use std::collections::HashSet;

pub const NODES_TABLE: &str = "nodes";
pub const EDGES_TABLE: &str = "edges";

lazy_static! {
    /// Columns on `nodes` that are real SQL columns rather than JSON
    /// properties. `type` is the label column; `properties` is the JSON
    /// bag everything else routes through.
    pub static ref NODE_COLUMNS: HashSet<&'static str> = [
        "uuid",
        "type",
        "group_id",
        "name",
        "summary",
        "properties",
        "created_at",
        "valid_at",
        "invalid_at",
    ]
    .into_iter()
    .collect();

    /// Columns on `edges` that are real SQL columns rather than JSON
    /// properties.
    pub static ref EDGE_COLUMNS: HashSet<&'static str> = [
        "uuid",
        "source",
        "target",
        "relation_type",
        "group_id",
        "properties",
        "fact",
        "episodes",
        "created_at",
        "valid_at",
        "invalid_at",
    ]
    .into_iter()
    .collect();
}

/// Which table an alias refers to, used to pick the right known-columns set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Node,
    Edge,
}

impl TableKind {
    pub fn known_columns(self) -> &'static HashSet<&'static str> {
        match self {
            TableKind::Node => &NODE_COLUMNS,
            TableKind::Edge => &EDGE_COLUMNS,
        }
    }

    pub fn table_name(self) -> &'static str {
        match self {
            TableKind::Node => NODES_TABLE,
            TableKind::Edge => EDGES_TABLE,
        }
    }

    pub fn type_column(self) -> &'static str {
        match self {
            TableKind::Node => "type",
            TableKind::Edge => "relation_type",
        }
    }
}
