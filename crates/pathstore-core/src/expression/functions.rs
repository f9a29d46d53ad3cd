//! Callable functions for query terms.
//!
//! User functions are looked up first, so a registered `upper` shadows the
//! built-in one. Built-in names match case-insensitively.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use pathstore_model::Value;

use crate::cell::array_elements;
use crate::error::EvalError;

/// A function callable from a query term.
pub trait Callable: Send + Sync {
    /// Invoke the function with already-evaluated arguments.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if the arguments are invalid or the call fails.
    fn call(&self, args: &[Value]) -> Result<Value, EvalError>;
}

impl<F> Callable for F
where
    F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync,
{
    fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        self(args)
    }
}

/// Named user functions, shared between records behind an `Arc`.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn Callable>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

impl FunctionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, function: impl Callable + 'static) -> Self {
        self.register(name, function);
        self
    }

    /// Register `function` under `name`, replacing any previous entry.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: impl Callable + 'static,
    ) -> Option<Arc<dyn Callable>> {
        self.functions.insert(name.into(), Arc::new(function))
    }

    /// Remove a user function.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Callable>> {
        self.functions.remove(name)
    }

    /// The user function registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Callable> {
        self.functions.get(name).map(AsRef::as_ref)
    }

    /// Returns `true` if a user function is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of user functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns `true` if no user function is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Call `name`: the user function if registered, otherwise the built-in.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownFunction`] if neither exists, or whatever
    /// the function itself returns.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        if let Some(function) = self.functions.get(name) {
            return function.call(args);
        }
        match Builtin::lookup(name) {
            Some(builtin) => builtin.call(args),
            None => Err(EvalError::UnknownFunction {
                name: name.to_owned(),
            }),
        }
    }
}

/// Functions available to every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `upper(s)`: uppercase text.
    Upper,
    /// `lower(s)`: lowercase text.
    Lower,
    /// `len(x)`: characters in a string or elements in an array, including
    /// arrays stored as JSON text.
    Len,
}

impl Builtin {
    /// Find a built-in by name, ignoring ASCII case.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "upper" => Some(Self::Upper),
            "lower" => Some(Self::Lower),
            "len" => Some(Self::Len),
            _ => None,
        }
    }

    /// The built-in's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Len => "len",
        }
    }
}

impl Callable for Builtin {
    fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        let [arg] = args else {
            return Err(EvalError::invalid_argument(
                self.name(),
                format!("expected 1 argument, got {}", args.len()),
            ));
        };
        match (self, arg) {
            (Self::Upper | Self::Lower, Value::Null) => Ok(Value::Null),
            (Self::Upper, v) => Ok(Value::String(v.to_string().to_uppercase())),
            (Self::Lower, v) => Ok(Value::String(v.to_string().to_lowercase())),
            (Self::Len, Value::Null) => Ok(Value::Int(0)),
            (Self::Len, Value::String(s)) => Ok(Value::Int(count(
                array_elements(arg).map_or_else(|| s.chars().count(), |items| items.len()),
            ))),
            (Self::Len, Value::Array(items)) => Ok(Value::Int(count(items.len()))),
            (Self::Len, other) => Err(EvalError::invalid_argument(
                self.name(),
                format!("expected a string or array, got {}", other.type_tag()),
            )),
        }
    }
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
