//! Record model and query evaluator for PathStore.
//!
//! This crate turns heterogeneous input (nested maps, serializable structs,
//! or persisted flat rows) into a flattened [`Record`] and evaluates query
//! ASTs from [`pathstore_model`] against it.
//!
//! - [`cell`]: typed value cells with lazy, schema-driven coercion
//! - [`flatten`]: nested data to dot-joined paths and back
//! - [`de`]: lenient population of typed structs from records
//! - [`record`]: the record itself, its context, and typed getters
//! - [`expression`]: the evaluator, user and built-in functions, `LIKE`
//! - [`row`]: conversion to and from persisted text rows

pub mod cell;
pub mod config;
pub mod de;
pub mod error;
pub mod expression;
pub mod flatten;
pub mod record;
pub mod row;
pub mod schema;

pub use cell::ValueCell;
pub use config::{LikeMode, RecordConfig};
pub use error::{ConversionError, EvalError, PathStoreError, PathStoreResult, StructuralError};
pub use expression::{Builtin, Callable, FunctionRegistry};
pub use flatten::{FlatMap, flatten, flatten_serialize, unflatten};
pub use record::{Record, Variables};
pub use row::{RawRow, raw_map_to_row, row_to_raw_map};
pub use schema::Schema;
