//! Typed value cells.
//!
//! A [`ValueCell`] wraps the raw value stored at one flattened path. When a
//! schema declares a type for the path, the raw value is coerced on first
//! access and the result is memoized until the declared type changes.
//!
//! The free functions in this module hold the coercion and comparison rules
//! shared by cells and by the evaluator, which also needs them for values
//! that never live in a cell (literals, function results, arithmetic).

use std::cell::OnceCell;
use std::cmp::Ordering;

use pathstore_model::{DeclaredType, NULL, Operator, TypeTag, Value};

use crate::error::{ConversionError, EvalError};

/// A single field value with optional schema-driven coercion.
#[derive(Debug, Clone)]
pub struct ValueCell {
    raw: Value,
    declared_type: Option<DeclaredType>,
    converted: OnceCell<Value>,
    is_null: bool,
}

impl ValueCell {
    /// Create an untyped cell.
    #[must_use]
    pub fn new(raw: impl Into<Value>) -> Self {
        let raw = raw.into();
        let is_null = raw.is_null();
        Self {
            raw,
            declared_type: None,
            converted: OnceCell::new(),
            is_null,
        }
    }

    /// Create a cell whose value is coerced to `declared_type` on access.
    #[must_use]
    pub fn with_type(raw: impl Into<Value>, declared_type: DeclaredType) -> Self {
        let mut cell = Self::new(raw);
        cell.declared_type = Some(declared_type);
        cell
    }

    /// The value as stored, before any coercion.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The schema-declared type, if any.
    #[must_use]
    pub fn declared_type(&self) -> Option<&DeclaredType> {
        self.declared_type.as_ref()
    }

    /// Replace the declared type. Drops any memoized conversion.
    pub fn set_declared_type(&mut self, declared_type: Option<DeclaredType>) {
        if self.declared_type != declared_type {
            self.declared_type = declared_type;
            self.converted = OnceCell::new();
        }
    }

    /// Returns `true` if the raw value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.is_null
    }

    /// The effective value.
    ///
    /// Without a declared type, or with one the model does not coerce to, this
    /// is the raw value. Otherwise it is the raw value coerced to the declared
    /// type, computed once. A raw value that cannot be coerced is returned
    /// unchanged.
    #[must_use]
    pub fn value(&self) -> &Value {
        if self.is_null {
            return &NULL;
        }
        match &self.declared_type {
            Some(declared) if declared.is_known() => self
                .converted
                .get_or_init(|| coerce(&self.raw, declared).unwrap_or_else(|_| self.raw.clone())),
            _ => &self.raw,
        }
    }

    /// Integer view of the value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] for null, non-numeric strings, and
    /// containers.
    pub fn as_int64(&self) -> Result<i64, ConversionError> {
        to_int64(self.value())
    }

    /// Float view of the value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] for null, non-numeric strings, and
    /// containers.
    pub fn as_float64(&self) -> Result<f64, ConversionError> {
        to_float64(self.value())
    }

    /// Text view of the value; null is the empty string.
    #[must_use]
    pub fn as_string(&self) -> String {
        self.value().to_string()
    }

    /// Boolean view of the value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] for null, containers, and strings outside
    /// the accepted boolean set.
    pub fn as_bool(&self) -> Result<bool, ConversionError> {
        to_bool(self.value())
    }

    /// The declared type if set, otherwise the type inferred from the raw
    /// value. Strings that look like JSON arrays or objects report as
    /// [`TypeTag::Array`] or [`TypeTag::Map`].
    #[must_use]
    pub fn declared_or_inferred_type(&self) -> TypeTag {
        if let Some(declared) = &self.declared_type {
            return declared.type_tag();
        }
        match &self.raw {
            Value::String(s) if s.starts_with('[') && s.ends_with(']') => TypeTag::Array,
            Value::String(s) if s.starts_with('{') && s.ends_with('}') => TypeTag::Map,
            other => other.type_tag(),
        }
    }

    /// Compare with another cell using a comparison operator.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnsupportedOperator`] for non-comparison operators.
    pub fn compare(&self, other: &ValueCell, op: Operator) -> Result<bool, EvalError> {
        compare_values(self.value(), other.value(), op)
    }

    /// Null-aware equality with numeric and textual fallbacks.
    #[must_use]
    pub fn equals(&self, other: &ValueCell) -> bool {
        values_equal(self.value(), other.value())
    }

    /// Integer view that aborts on failure.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be converted.
    #[must_use]
    #[track_caller]
    pub fn must_int64(&self) -> i64 {
        self.as_int64().unwrap_or_else(|e| panic!("{e}"))
    }

    /// Float view that aborts on failure.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be converted.
    #[must_use]
    #[track_caller]
    pub fn must_float64(&self) -> f64 {
        self.as_float64().unwrap_or_else(|e| panic!("{e}"))
    }

    /// Boolean view that aborts on failure.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be converted.
    #[must_use]
    #[track_caller]
    pub fn must_bool(&self) -> bool {
        self.as_bool().unwrap_or_else(|e| panic!("{e}"))
    }
}

impl From<Value> for ValueCell {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Convert a value to `i64`. Floats and decimal strings truncate toward zero.
///
/// # Errors
///
/// Returns a [`ConversionError`] when the value has no integer reading.
#[allow(clippy::cast_possible_truncation)]
pub fn to_int64(value: &Value) -> Result<i64, ConversionError> {
    const TARGET: &str = "int64";
    match value {
        Value::Null => Err(ConversionError::Null { target: TARGET }),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Int(i) => Ok(*i),
        Value::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
        Value::Float(f) => Err(ConversionError::NotNumeric {
            value: f.to_string(),
            target: TARGET,
        }),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(i);
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(f.trunc() as i64),
                _ => Err(ConversionError::NotNumeric {
                    value: s.clone(),
                    target: TARGET,
                }),
            }
        }
        Value::Array(_) | Value::Object(_) => Err(ConversionError::Unsupported {
            kind: value.type_tag(),
            target: TARGET,
        }),
    }
}

/// Convert a value to `f64`.
///
/// # Errors
///
/// Returns a [`ConversionError`] when the value has no numeric reading.
#[allow(clippy::cast_precision_loss)]
pub fn to_float64(value: &Value) -> Result<f64, ConversionError> {
    const TARGET: &str = "float64";
    match value {
        Value::Null => Err(ConversionError::Null { target: TARGET }),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ConversionError::NotNumeric {
                value: s.clone(),
                target: TARGET,
            }),
        Value::Array(_) | Value::Object(_) => Err(ConversionError::Unsupported {
            kind: value.type_tag(),
            target: TARGET,
        }),
    }
}

/// Convert a value to `bool`.
///
/// Numbers are true when non-zero. Strings accept `true`, `1`, `yes`, `t` and
/// `false`, `0`, `no`, `f`, or empty, ignoring ASCII case.
///
/// # Errors
///
/// Returns a [`ConversionError`] for null, containers, and other strings.
#[allow(clippy::float_cmp)]
pub fn to_bool(value: &Value) -> Result<bool, ConversionError> {
    const TARGET: &str = "bool";
    match value {
        Value::Null => Err(ConversionError::Null { target: TARGET }),
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "t" => Ok(true),
            "false" | "0" | "no" | "f" | "" => Ok(false),
            _ => Err(ConversionError::NotBool { value: s.clone() }),
        },
        Value::Array(_) | Value::Object(_) => Err(ConversionError::Unsupported {
            kind: value.type_tag(),
            target: TARGET,
        }),
    }
}

/// Coerce a value to a declared type. Null and unknown types pass through.
///
/// # Errors
///
/// Returns a [`ConversionError`] when the value cannot take the declared type.
pub fn coerce(value: &Value, declared: &DeclaredType) -> Result<Value, ConversionError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    Ok(match declared {
        DeclaredType::Int => Value::Int(to_int64(value)?),
        DeclaredType::Float => Value::Float(to_float64(value)?),
        DeclaredType::String => Value::String(value.to_string()),
        DeclaredType::Bool => Value::Bool(to_bool(value)?),
        DeclaredType::Other(_) => value.clone(),
    })
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Elements of an in-memory array or of JSON-array text. Records store
/// arrays as text, so operators that need elements go through here.
pub(crate) fn array_elements(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::String(text) if text.starts_with('[') => match Value::from_json_text(text) {
            Ok(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Null-aware equality: both null are equal, one null is unequal, otherwise
/// direct, then numeric, then textual equality.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.is_null(), b.is_null()) {
        (true, true) => return true,
        (true, false) | (false, true) => return false,
        (false, false) => {}
    }
    if a == b {
        return true;
    }
    if let (Ok(x), Ok(y)) = (to_float64(a), to_float64(b)) {
        if x == y {
            return true;
        }
    }
    a.to_string() == b.to_string()
}

/// Apply a comparison operator to two values.
///
/// Ordering operators compare numerically when both sides have a numeric
/// reading and textually otherwise.
///
/// # Errors
///
/// Returns [`EvalError::UnsupportedOperator`] for non-comparison operators.
pub fn compare_values(a: &Value, b: &Value, op: Operator) -> Result<bool, EvalError> {
    if !op.is_comparison() {
        return Err(EvalError::UnsupportedOperator { op: op.to_string() });
    }
    let ordering = match op {
        Operator::Eq => return Ok(values_equal(a, b)),
        Operator::Ne => return Ok(!values_equal(a, b)),
        _ => order(a, b),
    };
    // NaN has no ordering and never satisfies a comparison.
    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match op {
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Lt => ordering == Ordering::Less,
        Operator::Ge => ordering != Ordering::Less,
        _ => ordering != Ordering::Greater,
    })
}

fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (to_float64(a), to_float64(b)) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y),
        _ => Some(a.to_string().cmp(&b.to_string())),
    }
}
