//! Model-level error types.

/// An operator name that does not map onto any supported operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported operator: {op}")]
pub struct UnsupportedOperator {
    /// The operator text as received.
    pub op: String,
}

impl UnsupportedOperator {
    /// Create a new error for the given operator text.
    #[must_use]
    pub fn new(op: impl Into<String>) -> Self {
        Self { op: op.into() }
    }
}
