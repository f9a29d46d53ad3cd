//! Model types for the PathStore record model.
//!
//! This crate holds the pure data shared between the record evaluator and its
//! collaborators: the closed [`Value`] sum type every field and term resolves
//! to, the declared/inferred type tags, and the query AST an external parser
//! produces and the evaluator consumes.
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod query;
pub mod types;
pub mod value;

pub use error::UnsupportedOperator;
pub use query::{ArithmeticOp, Condition, Operator, Query, Term};
pub use types::{DeclaredType, TypeTag};
pub use value::{NULL, Value};
