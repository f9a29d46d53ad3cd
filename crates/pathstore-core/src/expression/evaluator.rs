//! Query evaluation against a [`Record`].

use std::borrow::Cow;

use pathstore_model::{ArithmeticOp, Condition, DeclaredType, NULL, Operator, Query, Term, Value};

use crate::cell::{array_elements, coerce, compare_values, to_float64, values_equal};
use crate::error::EvalError;
use crate::record::Record;

impl Record {
    /// Evaluate a query against this record.
    ///
    /// An AND query matches when every condition and sub-query matches; an OR
    /// query when any one does. Both short-circuit. A query with nothing in it
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns the first [`EvalError`] raised while evaluating a condition
    /// that is actually reached.
    pub fn matches(&self, query: &Query) -> Result<bool, EvalError> {
        self.eval_query(query, 0)
    }

    /// Evaluate a single condition against this record.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if a term cannot be resolved or the operands
    /// do not suit the operator.
    pub fn matches_condition(&self, condition: &Condition) -> Result<bool, EvalError> {
        self.eval_condition(condition, 0)
    }

    /// Resolve a term to its value in the context of this record.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] for unbound variables, failed functions,
    /// invalid arithmetic, and unknown cast targets.
    pub fn resolve(&self, term: &Term) -> Result<Value, EvalError> {
        self.resolve_term(term, 0).map(Cow::into_owned)
    }

    fn check_depth(&self, depth: usize) -> Result<(), EvalError> {
        if depth > self.config.max_depth {
            return Err(EvalError::DepthExceeded {
                max: self.config.max_depth,
            });
        }
        Ok(())
    }

    fn eval_query(&self, query: &Query, depth: usize) -> Result<bool, EvalError> {
        self.check_depth(depth)?;
        if query.is_or {
            for condition in &query.conditions {
                if self.eval_condition(condition, depth + 1)? {
                    return Ok(true);
                }
            }
            for sub in &query.sub_queries {
                if self.eval_query(sub, depth + 1)? {
                    return Ok(true);
                }
            }
            Ok(query.is_empty())
        } else {
            for condition in &query.conditions {
                if !self.eval_condition(condition, depth + 1)? {
                    return Ok(false);
                }
            }
            for sub in &query.sub_queries {
                if !self.eval_query(sub, depth + 1)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }

    fn eval_condition(&self, condition: &Condition, depth: usize) -> Result<bool, EvalError> {
        self.check_depth(depth)?;
        let depth = depth + 1;
        let result = match condition.op {
            op @ (Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Lt
            | Operator::Ge
            | Operator::Le) => {
                let left = self.resolve_term(&condition.left, depth)?;
                let right = self.resolve_term(&condition.right, depth)?;
                compare_values(&left, &right, op)?
            }
            Operator::In => self.eval_in(condition, depth)?,
            Operator::NotIn => !self.eval_in(condition, depth)?,
            Operator::IsNull => self.resolve_term(&condition.left, depth)?.is_null(),
            Operator::IsNotNull => !self.resolve_term(&condition.left, depth)?.is_null(),
            Operator::Like => self.eval_like(condition, depth)?,
            Operator::Between => self.eval_between(condition, depth)?,
            Operator::Contains => self.eval_contains(condition, depth)?,
            Operator::AnyOf => self.eval_any_of(condition, depth)?,
        };
        Ok(result != condition.negate)
    }

    /// Candidate values for `IN`, `NOT_IN`, and `ANY_OF`: the evaluated
    /// `in_values`, or the elements of an array-valued right term.
    fn candidates(&self, condition: &Condition, depth: usize) -> Result<Vec<Value>, EvalError> {
        if !condition.in_values.is_empty() {
            return condition
                .in_values
                .iter()
                .map(|term| self.resolve_term(term, depth).map(Cow::into_owned))
                .collect();
        }
        let right = self.resolve_term(&condition.right, depth)?;
        Ok(match array_elements(&right) {
            Some(items) => items,
            None if right.is_null() => Vec::new(),
            None => vec![right.into_owned()],
        })
    }

    fn eval_in(&self, condition: &Condition, depth: usize) -> Result<bool, EvalError> {
        let left = self.resolve_term(&condition.left, depth)?;
        let candidates = self.candidates(condition, depth)?;
        Ok(candidates.iter().any(|c| values_equal(&left, c)))
    }

    fn eval_like(&self, condition: &Condition, depth: usize) -> Result<bool, EvalError> {
        let left = self.resolve_term(&condition.left, depth)?;
        if left.is_null() {
            return Ok(false);
        }
        let pattern = if condition.pattern.is_empty() {
            Cow::Owned(self.resolve_term(&condition.right, depth)?.to_string())
        } else {
            Cow::Borrowed(condition.pattern.as_str())
        };
        self.like_cache
            .is_match(self.config.like_mode, &left.to_string(), &pattern)
    }

    fn eval_between(&self, condition: &Condition, depth: usize) -> Result<bool, EvalError> {
        let (Some(start), Some(end)) = (&condition.start, &condition.end) else {
            return Err(EvalError::malformed(
                Operator::Between,
                "both bounds are required",
            ));
        };
        let left = self.resolve_term(&condition.left, depth)?;
        let start = self.resolve_term(start, depth)?;
        let end = self.resolve_term(end, depth)?;
        Ok(compare_values(&left, &start, Operator::Ge)?
            && compare_values(&left, &end, Operator::Le)?)
    }

    fn eval_contains(&self, condition: &Condition, depth: usize) -> Result<bool, EvalError> {
        let left = self.resolve_term(&condition.left, depth)?;
        let right = self.resolve_term(&condition.right, depth)?;
        match &*left {
            Value::Null => Ok(false),
            Value::Array(items) => Ok(items.iter().any(|item| values_equal(item, &right))),
            Value::String(s) => Ok(match array_elements(&left) {
                Some(items) => items.iter().any(|item| values_equal(item, &right)),
                None => s.contains(&right.to_string()),
            }),
            Value::Object(map) => Ok(map.contains_key(&right.to_string())),
            other => Err(EvalError::malformed(
                Operator::Contains,
                format!("left operand must be an array, string, or map, got {}", other.type_tag()),
            )),
        }
    }

    fn eval_any_of(&self, condition: &Condition, depth: usize) -> Result<bool, EvalError> {
        let left = self.resolve_term(&condition.left, depth)?;
        if left.is_null() {
            return Ok(false);
        }
        let Some(elements) = array_elements(&left) else {
            return Err(EvalError::malformed(
                Operator::AnyOf,
                format!("left operand must be an array, got {}", left.type_tag()),
            ));
        };
        let candidates = self.candidates(condition, depth)?;
        Ok(elements
            .iter()
            .any(|e| candidates.iter().any(|c| values_equal(e, c))))
    }

    // -----------------------------------------------------------------------
    // Terms
    // -----------------------------------------------------------------------

    fn resolve_term<'a>(&'a self, term: &'a Term, depth: usize) -> Result<Cow<'a, Value>, EvalError> {
        self.check_depth(depth)?;
        let value = match term {
            Term::Property { path } => Cow::Borrowed(self.get(path).unwrap_or(&NULL)),
            Term::Literal { value } => Cow::Borrowed(value),
            Term::Variable { name } => {
                let key = name.strip_prefix('$').unwrap_or(name);
                let value = self
                    .variables
                    .get(key)
                    .ok_or_else(|| EvalError::UnresolvedVariable {
                        name: key.to_owned(),
                    })?;
                Cow::Borrowed(value)
            }
            Term::Function { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.resolve_term(arg, depth + 1).map(Cow::into_owned))
                    .collect::<Result<Vec<_>, _>>()?;
                Cow::Owned(self.functions.call(name, &args)?)
            }
            Term::Arithmetic { op, left, right } => {
                let left = self.resolve_term(left, depth + 1)?;
                let right = self.resolve_term(right, depth + 1)?;
                Cow::Owned(arithmetic(*op, &left, &right)?)
            }
            Term::Cast { target, term } => {
                let declared = DeclaredType::parse(target);
                if !declared.is_known() {
                    return Err(EvalError::UnknownCastType {
                        target: target.clone(),
                    });
                }
                let value = self.resolve_term(term, depth + 1)?;
                Cow::Owned(coerce(&value, &declared)?)
            }
            Term::DateTime { .. } => Cow::Owned(Value::String(self.config.datetime_marker.clone())),
        };
        Ok(value)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let operand = |v: &Value| {
        to_float64(v).map_err(|_| EvalError::NonNumericOperand {
            op: op.to_string(),
            value: v.to_string(),
        })
    };
    let (x, y) = (operand(left)?, operand(right)?);
    let result = match op {
        ArithmeticOp::Add => x + y,
        ArithmeticOp::Sub => x - y,
        ArithmeticOp::Mul => x * y,
        ArithmeticOp::Div => {
            if y == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            x / y
        }
        ArithmeticOp::Mod => {
            let divisor = y.trunc() as i64;
            if divisor == 0 {
                return Err(EvalError::ModuloByZero);
            }
            (x.trunc() as i64).wrapping_rem(divisor) as f64
        }
    };
    Ok(Value::Float(result))
}
