//! The typed AST produced by the parser.
//!
//! Structural sharing between nodes is forbidden: each subtree has a single
//! owner. Nodes borrow from the source text (`&'a str`) rather than
//! allocating for every identifier, label, or relationship type — the same
//! shape the teacher's `open_cypher_parser::ast` uses.

use std::borrow::Cow;

/// A full Cypher statement: one query, optionally unioned with more.
#[derive(Debug, PartialEq, Clone)]
pub struct CypherAst<'a> {
    pub first: Query<'a>,
    pub rest: Vec<(UnionType, Query<'a>)>,
}

impl<'a> CypherAst<'a> {
    pub fn is_union(&self) -> bool {
        !self.rest.is_empty()
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnionType {
    /// `UNION` — duplicate rows across branches are removed.
    Distinct,
    /// `UNION ALL` — duplicate rows are kept.
    All,
}

/// One query body: an ordered list of clauses.
///
/// `spec.md` §3 describes `Query` as "an ordered list of top-level clauses".
/// This is a direct encoding of that, rather than the teacher's nested
/// struct-of-optionals with explicit `subsequent_with`/`subsequent_match`
/// chaining fields (see `SPEC_FULL.md` §3 for why).
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Query<'a> {
    pub clauses: Vec<Clause<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Clause<'a> {
    Match(Match<'a>),
    Create(Create<'a>),
    Merge(Merge<'a>),
    Delete(Delete<'a>),
    Set(Set<'a>),
    Remove(Remove<'a>),
    With(With<'a>),
    Return(Return<'a>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Match<'a> {
    pub patterns: Vec<Pattern<'a>>,
    pub where_: Option<Expression<'a>>,
    pub optional: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Create<'a> {
    pub patterns: Vec<Pattern<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Merge<'a> {
    pub pattern: Pattern<'a>,
    pub on_match: Vec<SetItem<'a>>,
    pub on_create: Vec<SetItem<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Delete<'a> {
    pub detach: bool,
    pub items: Vec<Expression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Set<'a> {
    pub items: Vec<SetItem<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SetItem<'a> {
    pub target: PropertyAccess<'a>,
    pub value: Expression<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Remove<'a> {
    pub items: Vec<PropertyAccess<'a>>,
}

/// `RETURN` or `WITH` projection item: an expression plus optional alias.
#[derive(Debug, PartialEq, Clone)]
pub struct ProjectionItem<'a> {
    pub expression: Expression<'a>,
    pub alias: Option<&'a str>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Return<'a> {
    pub distinct: bool,
    pub items: Vec<ProjectionItem<'a>>,
    pub order_by: Vec<OrderByItem<'a>>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct With<'a> {
    pub distinct: bool,
    pub items: Vec<ProjectionItem<'a>>,
    pub where_: Option<Expression<'a>>,
    pub order_by: Vec<OrderByItem<'a>>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct OrderByItem<'a> {
    pub expression: Expression<'a>,
    pub descending: bool,
}

/// Alternating node/relationship sequence: `(a)-[:T]->(b)-[:T2]->(c)`.
#[derive(Debug, PartialEq, Clone)]
pub struct Pattern<'a> {
    pub path_var: Option<&'a str>,
    pub start: NodePattern<'a>,
    pub hops: Vec<(RelPattern<'a>, NodePattern<'a>)>,
}

impl<'a> Pattern<'a> {
    pub fn singleton(node: NodePattern<'a>) -> Self {
        Pattern {
            path_var: None,
            start: node,
            hops: Vec::new(),
        }
    }

    /// Every `NodePattern` in the chain, in order.
    pub fn nodes(&self) -> Vec<&NodePattern<'a>> {
        let mut out = vec![&self.start];
        for (_, n) in &self.hops {
            out.push(n);
        }
        out
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct NodePattern<'a> {
    pub variable: Option<&'a str>,
    pub label: Option<&'a str>,
    pub properties: Option<Vec<PropertyKV<'a>>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct RelPattern<'a> {
    pub variable: Option<&'a str>,
    pub types: Vec<&'a str>,
    pub direction: Direction,
    pub length: RelLength,
    pub properties: Option<Vec<PropertyKV<'a>>>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Direction {
    Outgoing, // ->
    Incoming, // <-
    Either,   // -
}

/// Relationship hop length. A plain `[:T]` is `Fixed`; `*`, `*n`, `*n..`,
/// `*..m`, `*n..m` are all `Range`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum RelLength {
    Fixed,
    Range { min: u32, max: Option<u32> },
}

#[derive(Debug, PartialEq, Clone)]
pub struct PropertyKV<'a> {
    pub key: &'a str,
    pub value: Expression<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct PropertyAccess<'a> {
    pub base: &'a str,
    pub key: &'a str,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal<'a> {
    Int(i64),
    Float(f64),
    Str(Cow<'a, str>),
    Bool(bool),
    Null,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    And,
    Or,
    Xor,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CompareOperator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Neg,
    Not,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LikeKind {
    StartsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionCall<'a> {
    pub name: String,
    pub args: Vec<Expression<'a>>,
    pub distinct: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Case<'a> {
    /// `Some` for the simple form `CASE x WHEN ...`, `None` for searched
    /// `CASE WHEN ... `.
    pub subject: Option<Box<Expression<'a>>>,
    pub when_then: Vec<(Expression<'a>, Expression<'a>)>,
    pub else_: Option<Box<Expression<'a>>>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression<'a> {
    Literal(Literal<'a>),
    Variable(&'a str),
    Param(&'a str),
    List(Vec<Expression<'a>>),
    Map(Vec<(&'a str, Expression<'a>)>),
    PropertyAccess(PropertyAccess<'a>),
    FunctionCall(FunctionCall<'a>),
    BinOp {
        op: BinOperator,
        lhs: Box<Expression<'a>>,
        rhs: Box<Expression<'a>>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression<'a>>,
    },
    Compare {
        op: CompareOperator,
        lhs: Box<Expression<'a>>,
        rhs: Box<Expression<'a>>,
    },
    In {
        expr: Box<Expression<'a>>,
        list: Box<Expression<'a>>,
    },
    IsNull {
        expr: Box<Expression<'a>>,
        negated: bool,
    },
    Like {
        kind: LikeKind,
        expr: Box<Expression<'a>>,
        pattern: Box<Expression<'a>>,
    },
    RegexMatch {
        expr: Box<Expression<'a>>,
        pattern: Box<Expression<'a>>,
    },
    Case(Case<'a>),
}

impl<'a> Expression<'a> {
    /// Whether this expression is a call to an aggregate function.
    /// Per `spec.md` §4.3.4: `COUNT|SUM|AVG|MIN|MAX|COLLECT`.
    pub fn is_aggregate_call(&self) -> bool {
        matches!(self, Expression::FunctionCall(f) if is_aggregate_name(&f.name))
    }

    /// Whether this expression contains an aggregate call anywhere in its
    /// tree (used to decide whether a projection item is itself
    /// "aggregating", even when the aggregate is nested inside arithmetic).
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expression::FunctionCall(f) => {
                is_aggregate_name(&f.name) || f.args.iter().any(Expression::contains_aggregate)
            }
            Expression::BinOp { lhs, rhs, .. } | Expression::Compare { lhs, rhs, .. } => {
                lhs.contains_aggregate() || rhs.contains_aggregate()
            }
            Expression::UnaryOp { expr, .. } => expr.contains_aggregate(),
            Expression::In { expr, list } => expr.contains_aggregate() || list.contains_aggregate(),
            Expression::IsNull { expr, .. } => expr.contains_aggregate(),
            Expression::Like { expr, pattern, .. } | Expression::RegexMatch { expr, pattern } => {
                expr.contains_aggregate() || pattern.contains_aggregate()
            }
            Expression::Case(c) => {
                c.subject.as_deref().is_some_and(Expression::contains_aggregate)
                    || c.when_then
                        .iter()
                        .any(|(w, t)| w.contains_aggregate() || t.contains_aggregate())
                    || c.else_.as_deref().is_some_and(Expression::contains_aggregate)
            }
            Expression::List(items) => items.iter().any(Expression::contains_aggregate),
            _ => false,
        }
    }
}

pub fn is_aggregate_name(name: &str) -> bool {
    matches!(
        name.to_ascii_uppercase().as_str(),
        "COUNT" | "SUM" | "AVG" | "MIN" | "MAX" | "COLLECT"
    )
}
