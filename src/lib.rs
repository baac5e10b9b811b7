//! cyphersql - translates a subset of openCypher into parameterised SQL
//!
//! The crate exposes two entry points consumed by a driver layer that sits
//! outside this core: [`parse`] turns Cypher text into a typed AST, and
//! [`generate`] lowers that AST into a SQL string plus a positional
//! parameter list ready for prepared-statement execution.

/// Debug-only trace logging, compiled out entirely in release builds.
#[macro_export]
macro_rules! debug_print {
    ($($arg:tt)*) => {
        #[cfg(debug_assertions)]
        log::trace!($($arg)*);
    };
}

pub mod cypher_parser;
pub mod pretty_print;
pub mod schema;
pub mod sql_generator;

pub use cypher_parser::ast::CypherAst;
pub use cypher_parser::errors::ParseError;
pub use sql_generator::errors::GenerationError;

use std::collections::HashMap;

/// Parse Cypher source text into a typed AST.
///
/// Deterministic: the same input always yields a byte-identical AST.
/// Whitespace-only input is rejected as a [`ParseError`].
pub fn parse(cypher: &str) -> Result<CypherAst<'_>, ParseError> {
    cypher_parser::parse(cypher)
}

/// Lower an AST into a SQL string and its positional parameter list.
///
/// `tenant_id` is bound as parameter `$1` and injected as a `group_id`
/// predicate on every node and edge table reference in the generated SQL.
pub fn generate(
    ast: &CypherAst<'_>,
    named_params: &HashMap<String, serde_json::Value>,
    tenant_id: &str,
) -> Result<(String, Vec<serde_json::Value>), GenerationError> {
    sql_generator::generate(ast, named_params, tenant_id)
}
