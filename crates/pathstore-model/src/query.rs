//! Query AST consumed by the record evaluator.
//!
//! The AST is produced by an external filter parser and is read-only during
//! evaluation. A [`Query`] combines [`Condition`]s and nested sub-queries with
//! AND or OR; each condition applies an [`Operator`] to [`Term`]s.
//!
//! The module also provides helpers to collect every property path and
//! variable name a query references, used to check bindings before a scan.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::UnsupportedOperator;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Query and condition
// ---------------------------------------------------------------------------

/// A boolean combination of conditions and nested queries.
///
/// With `is_or = false` every condition and sub-query must match; with
/// `is_or = true` any single one is enough.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Query {
    /// Combine with OR instead of AND.
    #[builder(default)]
    #[serde(default)]
    pub is_or: bool,
    /// Leaf conditions.
    #[builder(default)]
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Nested queries.
    #[builder(default)]
    #[serde(default)]
    pub sub_queries: Vec<Query>,
}

impl Query {
    /// A query that matches when all `conditions` match.
    #[must_use]
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self {
            is_or: false,
            conditions,
            sub_queries: Vec::new(),
        }
    }

    /// A query that matches when any of `conditions` matches.
    ///
    /// An OR query with no conditions and no sub-queries matches, the same
    /// as an empty AND query.
    #[must_use]
    pub fn or(conditions: Vec<Condition>) -> Self {
        Self {
            is_or: true,
            conditions,
            sub_queries: Vec::new(),
        }
    }

    /// A query holding a single condition.
    #[must_use]
    pub fn single(condition: Condition) -> Self {
        Self::and(vec![condition])
    }

    /// Append a nested query.
    #[must_use]
    pub fn with_sub_query(mut self, query: Query) -> Self {
        self.sub_queries.push(query);
        self
    }

    /// Returns `true` if the query has no conditions and no sub-queries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.sub_queries.is_empty()
    }

    /// All property paths referenced anywhere in the query.
    #[must_use]
    pub fn properties(&self) -> HashSet<String> {
        let mut out = HashSet::new();
        collect_properties_from_query(self, &mut out);
        out
    }

    /// All variable names referenced anywhere in the query, without a `$` prefix.
    #[must_use]
    pub fn variables(&self) -> HashSet<String> {
        let mut out = HashSet::new();
        collect_variables_from_query(self, &mut out);
        out
    }
}

/// A single operator applied to terms.
///
/// Which fields are read depends on `op`: comparisons use `left` and `right`,
/// `IN`/`NOT_IN`/`ANY_OF` use `in_values`, `BETWEEN` uses `start` and `end`,
/// and `LIKE` uses `pattern`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Condition {
    /// The operator.
    pub op: Operator,
    /// Left-hand term.
    #[builder(setter(into))]
    pub left: Term,
    /// Right-hand term.
    #[builder(default, setter(into))]
    #[serde(default)]
    pub right: Term,
    /// Invert the result.
    #[builder(default)]
    #[serde(default)]
    pub negate: bool,
    /// Candidate list for `IN`, `NOT_IN`, and `ANY_OF`.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_values: Vec<Term>,
    /// Lower bound (inclusive) for `BETWEEN`.
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Term>,
    /// Upper bound (inclusive) for `BETWEEN`.
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Term>,
    /// Wildcard pattern for `LIKE`.
    #[builder(default, setter(into))]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,
}

impl Condition {
    /// `left op right` for a comparison operator.
    #[must_use]
    pub fn compare(left: Term, op: Operator, right: Term) -> Self {
        Self::builder().op(op).left(left).right(right).build()
    }

    /// `left IN (values...)`.
    #[must_use]
    pub fn is_in(left: Term, values: Vec<Term>) -> Self {
        Self::builder()
            .op(Operator::In)
            .left(left)
            .in_values(values)
            .build()
    }

    /// `left NOT IN (values...)`.
    #[must_use]
    pub fn not_in(left: Term, values: Vec<Term>) -> Self {
        Self::builder()
            .op(Operator::NotIn)
            .left(left)
            .in_values(values)
            .build()
    }

    /// `left IS NULL`.
    #[must_use]
    pub fn is_null(left: Term) -> Self {
        Self::builder().op(Operator::IsNull).left(left).build()
    }

    /// `left IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(left: Term) -> Self {
        Self::builder().op(Operator::IsNotNull).left(left).build()
    }

    /// `left LIKE pattern`.
    #[must_use]
    pub fn like(left: Term, pattern: impl Into<String>) -> Self {
        Self::builder()
            .op(Operator::Like)
            .left(left)
            .pattern(pattern)
            .build()
    }

    /// `left BETWEEN start AND end`.
    #[must_use]
    pub fn between(left: Term, start: Term, end: Term) -> Self {
        Self::builder()
            .op(Operator::Between)
            .left(left)
            .start(start)
            .end(end)
            .build()
    }

    /// `left CONTAINS right`.
    #[must_use]
    pub fn contains(left: Term, right: Term) -> Self {
        Self::compare(left, Operator::Contains, right)
    }

    /// `left ANY_OF (values...)`.
    #[must_use]
    pub fn any_of(left: Term, values: Vec<Term>) -> Self {
        Self::builder()
            .op(Operator::AnyOf)
            .left(left)
            .in_values(values)
            .build()
    }

    /// The same condition with its negation flag flipped.
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Condition operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `IN`
    In,
    /// `NOT_IN`
    NotIn,
    /// `IS_NULL`
    IsNull,
    /// `IS_NOT_NULL`
    IsNotNull,
    /// `LIKE`
    Like,
    /// `BETWEEN`
    Between,
    /// `CONTAINS`
    Contains,
    /// `ANY_OF`
    AnyOf,
}

impl Operator {
    /// Returns the canonical operator text.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
            Self::IsNull => "IS_NULL",
            Self::IsNotNull => "IS_NOT_NULL",
            Self::Like => "LIKE",
            Self::Between => "BETWEEN",
            Self::Contains => "CONTAINS",
            Self::AnyOf => "ANY_OF",
        }
    }

    /// Returns `true` for `==`, `!=`, `>`, `<`, `>=`, `<=`.
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Gt | Self::Lt | Self::Ge | Self::Le
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = UnsupportedOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(' ', "_");
        let op = match normalized.as_str() {
            "==" | "=" => Self::Eq,
            "!=" | "<>" => Self::Ne,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            "IN" => Self::In,
            "NOT_IN" => Self::NotIn,
            "IS_NULL" => Self::IsNull,
            "IS_NOT_NULL" => Self::IsNotNull,
            "LIKE" => Self::Like,
            "BETWEEN" => Self::Between,
            "CONTAINS" => Self::Contains,
            "ANY_OF" => Self::AnyOf,
            _ => return Err(UnsupportedOperator::new(s)),
        };
        Ok(op)
    }
}

impl TryFrom<String> for Operator {
    type Error = UnsupportedOperator;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_owned()
    }
}

/// Arithmetic operators for [`Term::Arithmetic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ArithmeticOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%` (integer-truncating)
    Mod,
}

impl ArithmeticOp {
    /// Returns the operator symbol.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArithmeticOp {
    type Err = UnsupportedOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Self::Add),
            "-" => Ok(Self::Sub),
            "*" => Ok(Self::Mul),
            "/" => Ok(Self::Div),
            "%" => Ok(Self::Mod),
            other => Err(UnsupportedOperator::new(other)),
        }
    }
}

impl TryFrom<String> for ArithmeticOp {
    type Error = UnsupportedOperator;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ArithmeticOp> for String {
    fn from(op: ArithmeticOp) -> Self {
        op.as_str().to_owned()
    }
}

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

/// A value producer inside a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Term {
    /// A flattened property path (e.g. `location.city`).
    Property {
        /// Dot-joined path.
        path: String,
    },
    /// An embedded literal.
    Literal {
        /// The literal value.
        value: Value,
    },
    /// A bound variable reference (e.g. `$maxAge`).
    Variable {
        /// Variable name, with or without a leading `$`.
        name: String,
    },
    /// A function call.
    Function {
        /// Function name.
        name: String,
        /// Argument terms.
        #[serde(default)]
        args: Vec<Term>,
    },
    /// Binary arithmetic.
    Arithmetic {
        /// Operator.
        op: ArithmeticOp,
        /// Left operand.
        left: Box<Term>,
        /// Right operand.
        right: Box<Term>,
    },
    /// Type cast (e.g. `CAST(age AS float)`).
    Cast {
        /// Target type name.
        target: String,
        /// Term to convert.
        term: Box<Term>,
    },
    /// Date/time marker (e.g. `NOW()`), resolved to a fixed placeholder.
    DateTime {
        /// Marker name as written.
        name: String,
    },
}

impl Default for Term {
    fn default() -> Self {
        Self::Literal { value: Value::Null }
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Self::Literal { value }
    }
}

impl Term {
    /// A property path term.
    #[must_use]
    pub fn property(path: impl Into<String>) -> Self {
        Self::Property { path: path.into() }
    }

    /// A literal term.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    /// A variable reference term.
    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable { name: name.into() }
    }

    /// A function call term.
    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<Term>) -> Self {
        Self::Function {
            name: name.into(),
            args,
        }
    }

    /// A binary arithmetic term.
    #[must_use]
    pub fn arithmetic(left: Term, op: ArithmeticOp, right: Term) -> Self {
        Self::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// A cast term.
    #[must_use]
    pub fn cast(term: Term, target: impl Into<String>) -> Self {
        Self::Cast {
            target: target.into(),
            term: Box::new(term),
        }
    }

    /// A date/time marker term.
    #[must_use]
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::DateTime { name: name.into() }
    }
}

// ---------------------------------------------------------------------------
// Collecting referenced properties and variables
// ---------------------------------------------------------------------------

/// Collect every property path referenced in a query, including sub-queries.
#[allow(clippy::implicit_hasher)]
pub fn collect_properties_from_query(query: &Query, paths: &mut HashSet<String>) {
    for condition in &query.conditions {
        for term in condition_terms(condition) {
            collect_properties_from_term(term, paths);
        }
    }
    for sub in &query.sub_queries {
        collect_properties_from_query(sub, paths);
    }
}

/// Collect every variable name referenced in a query, including sub-queries.
/// Names are returned without a leading `$`.
#[allow(clippy::implicit_hasher)]
pub fn collect_variables_from_query(query: &Query, names: &mut HashSet<String>) {
    for condition in &query.conditions {
        for term in condition_terms(condition) {
            collect_variables_from_term(term, names);
        }
    }
    for sub in &query.sub_queries {
        collect_variables_from_query(sub, names);
    }
}

fn condition_terms(condition: &Condition) -> impl Iterator<Item = &Term> {
    std::iter::once(&condition.left)
        .chain(std::iter::once(&condition.right))
        .chain(condition.in_values.iter())
        .chain(condition.start.iter())
        .chain(condition.end.iter())
}

fn collect_properties_from_term(term: &Term, paths: &mut HashSet<String>) {
    match term {
        Term::Property { path } => {
            paths.insert(path.clone());
        }
        Term::Function { args, .. } => {
            for arg in args {
                collect_properties_from_term(arg, paths);
            }
        }
        Term::Arithmetic { left, right, .. } => {
            collect_properties_from_term(left, paths);
            collect_properties_from_term(right, paths);
        }
        Term::Cast { term, .. } => collect_properties_from_term(term, paths),
        Term::Literal { .. } | Term::Variable { .. } | Term::DateTime { .. } => {}
    }
}

fn collect_variables_from_term(term: &Term, names: &mut HashSet<String>) {
    match term {
        Term::Variable { name } => {
            names.insert(name.strip_prefix('$').unwrap_or(name).to_owned());
        }
        Term::Function { args, .. } => {
            for arg in args {
                collect_variables_from_term(arg, names);
            }
        }
        Term::Arithmetic { left, right, .. } => {
            collect_variables_from_term(left, names);
            collect_variables_from_term(right, names);
        }
        Term::Cast { term, .. } => collect_variables_from_term(term, names),
        Term::Literal { .. } | Term::Property { .. } | Term::DateTime { .. } => {}
    }
}
