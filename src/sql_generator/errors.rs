//! Generation error type.
//!
//! Grounded on `clickhouse_query_generator/errors.rs`'s
//! `ClickhouseQueryGeneratorError`: a `thiserror` enum whose variants each
//! name the offending AST shape and, where applicable, the variable
//! involved, rather than a single catch-all string.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum GenerationError {
    #[error("variable '{variable}' is not bound by a preceding MATCH ({context})")]
    UnboundVariable { variable: String, context: &'static str },

    #[error("parameter '${0}' was not supplied in named_params")]
    UnboundParameter(String),

    #[error(
        "RETURN/WITH projects whole variable '{variable}' through an aggregating WITH; \
         project specific properties or an aggregate of '{variable}' instead"
    )]
    WholeVariableInAggregatingProjection { variable: String },

    #[error("a query body must end in RETURN or exactly one writing clause (CREATE, MERGE, DELETE, SET, or REMOVE)")]
    MissingTerminalClause,

    #[error("UNION branches project {left} and {right} columns respectively; both sides of a UNION must project the same number of columns")]
    MismatchedUnionShape { left: usize, right: usize },

    #[error("unsupported pattern shape: {0}")]
    UnsupportedPatternShape(&'static str),

    #[error("MERGE requires a property map on the pattern to use as its match key")]
    MergeWithoutKey,

    #[error("CREATE of a relationship requires both endpoints to already be bound by a preceding MATCH or CREATE")]
    UnboundRelationshipEndpoint,

    #[error("{0} target '{1}' must be a node or relationship variable bound by a preceding MATCH")]
    InvalidWriteTarget(&'static str, String),
}
