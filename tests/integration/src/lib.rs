//! End-to-end tests for the PathStore record model and query evaluator.
//!
//! Run them with:
//! ```text
//! cargo test -p pathstore-integration
//! ```
//!
//! Set `RUST_LOG=pathstore_core=debug` to see record population and
//! unflatten collisions in the test output.

use std::sync::Once;

use pathstore_core::Record;
use pathstore_model::{Term, Value};

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Build a record from JSON, initializing tracing first.
///
/// # Panics
///
/// Panics if `json` is not an object.
#[must_use]
pub fn record(json: serde_json::Value) -> Record {
    init_tracing();
    Record::from_value(&Value::from(json)).expect("test input must be a JSON object")
}

/// Shorthand for a property term.
#[must_use]
pub fn prop(path: &str) -> Term {
    Term::property(path)
}

/// Shorthand for a literal term.
#[must_use]
pub fn lit(value: impl Into<Value>) -> Term {
    Term::literal(value)
}

mod test_rows;
mod test_scan;
mod test_scenarios;
mod test_struct;
