//! Error types for the record model.
//!
//! Errors are split by where they surface: [`ConversionError`] for impossible
//! type coercions, [`EvalError`] for query evaluation, and [`StructuralError`]
//! for building records from, or populating values out of, nested data.
//! [`PathStoreError`] unifies the three for callers that do not care.

use std::fmt;

use pathstore_model::{TypeTag, UnsupportedOperator};

/// A value could not be coerced to the requested type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// The value is null.
    #[error("cannot convert null to {target}")]
    Null {
        /// Requested type.
        target: &'static str,
    },
    /// The value is not numeric.
    #[error("cannot convert {value:?} to {target}: not a number")]
    NotNumeric {
        /// Text form of the offending value.
        value: String,
        /// Requested type.
        target: &'static str,
    },
    /// The string is not in the accepted boolean set.
    #[error("cannot convert {value:?} to bool")]
    NotBool {
        /// Text form of the offending value.
        value: String,
    },
    /// The value's shape has no conversion to the requested type.
    #[error("cannot convert {kind} to {target}")]
    Unsupported {
        /// Shape of the value.
        kind: TypeTag,
        /// Requested type.
        target: &'static str,
    },
}

/// Errors produced while evaluating a query against a record.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// The operator is not valid in this position.
    #[error("unsupported operator: {op}")]
    UnsupportedOperator {
        /// The operator text.
        op: String,
    },
    /// Division by zero in an arithmetic term.
    #[error("division by zero")]
    DivisionByZero,
    /// Modulo by zero in an arithmetic term.
    #[error("modulo by zero")]
    ModuloByZero,
    /// An arithmetic operand is not numeric.
    #[error("non-numeric operand for {op}: {value:?}")]
    NonNumericOperand {
        /// The arithmetic operator.
        op: String,
        /// Text form of the operand.
        value: String,
    },
    /// A variable reference has no binding.
    #[error("unresolved variable: {name}")]
    UnresolvedVariable {
        /// The variable name.
        name: String,
    },
    /// A cast names a type the record model cannot convert to.
    #[error("unknown cast type: {target}")]
    UnknownCastType {
        /// The requested type name.
        target: String,
    },
    /// An operand has the wrong shape for the operator.
    #[error("invalid operand for {op}: {message}")]
    MalformedOperand {
        /// The operator.
        op: String,
        /// Explanation.
        message: String,
    },
    /// No registered or built-in function has this name.
    #[error("unknown function: {name}")]
    UnknownFunction {
        /// The function name.
        name: String,
    },
    /// A function was called with the wrong arguments.
    #[error("invalid argument for {function}: {message}")]
    InvalidArgument {
        /// The function name.
        function: String,
        /// Explanation.
        message: String,
    },
    /// A user-registered function failed.
    #[error("function {name} failed: {source}")]
    FunctionFailed {
        /// The function name.
        name: String,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },
    /// The query or one of its terms nests deeper than the configured limit.
    #[error("expression depth exceeds maximum of {max}")]
    DepthExceeded {
        /// The configured limit.
        max: usize,
    },
    /// A type conversion failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl EvalError {
    /// Wrap an arbitrary failure raised inside a user function.
    pub fn function_failed(name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::FunctionFailed {
            name: name.into(),
            source: source.into(),
        }
    }

    pub(crate) fn malformed(op: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::MalformedOperand {
            op: op.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.to_owned(),
            message: message.into(),
        }
    }
}

impl From<UnsupportedOperator> for EvalError {
    fn from(e: UnsupportedOperator) -> Self {
        Self::UnsupportedOperator { op: e.op }
    }
}

/// Errors raised while building a record or populating a typed value from one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralError {
    /// The input is not an object/struct.
    #[error("expected a map or struct, got {kind}")]
    NotComposite {
        /// Shape of the input.
        kind: TypeTag,
    },
    /// The input could not be serialized into a value tree.
    #[error("serialization failed: {0}")]
    Serialize(String),
    /// The value tree could not be deserialized into the target type.
    #[error("deserialization failed: {0}")]
    Deserialize(String),
    /// A string expected to hold JSON did not parse.
    #[error("invalid JSON text at {path}: {message}")]
    InvalidJson {
        /// Where the text was found.
        path: String,
        /// Parser message.
        message: String,
    },
}

impl serde::de::Error for StructuralError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Deserialize(msg.to_string())
    }
}

/// Any error raised by the record model.
#[derive(Debug, thiserror::Error)]
pub enum PathStoreError {
    /// Type conversion failure.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    /// Query evaluation failure.
    #[error(transparent)]
    Eval(#[from] EvalError),
    /// Record construction or population failure.
    #[error(transparent)]
    Structural(#[from] StructuralError),
}

/// Convenience result type for record model operations.
pub type PathStoreResult<T> = Result<T, PathStoreError>;
