//! Query evaluation: term resolution, operators, functions, and `LIKE`.
//!
//! The evaluator itself is implemented as methods on
//! [`Record`](crate::record::Record) (`matches`, `matches_condition`,
//! `resolve`).

mod evaluator;
pub mod functions;
pub mod like;

pub use functions::{Builtin, Callable, FunctionRegistry};
pub use like::{compile_pattern, substring_match};
