//! Flattened records.
//!
//! A [`Record`] holds one input document as path-keyed [`ValueCell`]s, plus
//! the context a query needs: a [`Schema`] of declared types, user functions,
//! bound variables, and a [`RecordConfig`].
//!
//! Records are meant to be reused across a scan: build one, then call
//! [`Record::set_data`] (or [`Record::reset`] and a setter) for each stored
//! node. Functions and variables sit behind `Arc`s so many records can share
//! them.
//!
//! # Examples
//!
//! ```
//! use pathstore_core::Record;
//! use pathstore_model::{Condition, Operator, Query, Term, Value};
//!
//! let value = Value::from(serde_json::json!({
//!     "name": "John Doe",
//!     "age": 30,
//!     "location": {"city": "New York"}
//! }));
//! let record = Record::from_value(&value).unwrap();
//!
//! let query = Query::and(vec![
//!     Condition::compare(Term::property("location.city"), Operator::Eq, Term::literal("New York")),
//!     Condition::compare(Term::property("age"), Operator::Ge, Term::literal(25)),
//! ]);
//! assert!(record.matches(&query).unwrap());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use pathstore_model::{DeclaredType, TypeTag, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cell::ValueCell;
use crate::config::RecordConfig;
use crate::de::from_value;
use crate::error::StructuralError;
use crate::expression::functions::{Callable, FunctionRegistry};
use crate::expression::like::LikeCache;
use crate::flatten::{FlatMap, flatten, flatten_into, flatten_serialize, unflatten};
use crate::schema::Schema;

/// Variable bindings, keyed by name without the `$` prefix.
pub type Variables = HashMap<String, Value>;

/// A flattened, path-addressed record.
///
/// `Record` is `Send` but not `Sync`: cells memoize conversions and `LIKE`
/// patterns are cached in place on first use.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub(crate) fields: HashMap<String, ValueCell>,
    pub(crate) schema: Schema,
    pub(crate) functions: Arc<FunctionRegistry>,
    pub(crate) variables: Arc<Variables>,
    pub(crate) config: RecordConfig,
    pub(crate) like_cache: LikeCache,
}

impl Record {
    /// An empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a nested object.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::NotComposite`] if `value` is not an object.
    pub fn from_value(value: &Value) -> Result<Self, StructuralError> {
        let mut record = Self::new();
        record.set_data(value)?;
        Ok(record)
    }

    /// Build a record from any serializable struct or map.
    ///
    /// # Errors
    ///
    /// Returns a [`StructuralError`] if `value` does not serialize to an
    /// object.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, StructuralError> {
        let mut record = Self::new();
        record.set_serialize(value)?;
        Ok(record)
    }

    /// Build a record from already-flattened entries.
    ///
    /// Object values are flattened under their key and arrays are stored as
    /// JSON text, so the path invariant holds whatever the input.
    pub fn from_flat<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Self::new();
        record.set_flat(entries);
        record
    }

    /// Attach a schema and apply it to every cell.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self.apply_schema();
        self
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: RecordConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a function registry.
    #[must_use]
    pub fn with_functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.functions = functions;
        self
    }

    /// Share a set of variable bindings.
    #[must_use]
    pub fn with_variables(mut self, variables: Arc<Variables>) -> Self {
        self.variables = variables;
        self
    }

    /// The schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    /// The function registry.
    #[must_use]
    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }

    /// The variable bindings.
    #[must_use]
    pub fn variables(&self) -> &Arc<Variables> {
        &self.variables
    }

    /// Register a user function on this record.
    ///
    /// A registry shared with other records is copied first, so they do not
    /// see the new function.
    pub fn register_function(&mut self, name: impl Into<String>, function: impl Callable + 'static) {
        Arc::make_mut(&mut self.functions).register(name, function);
    }

    /// Bind a variable. A leading `$` in `name` is ignored.
    ///
    /// A binding set shared with other records is copied first.
    pub fn set_variable(&mut self, name: &str, value: impl Into<Value>) {
        let name = name.strip_prefix('$').unwrap_or(name);
        Arc::make_mut(&mut self.variables).insert(name.to_owned(), value.into());
    }

    /// Remove a variable binding.
    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        let name = name.strip_prefix('$').unwrap_or(name);
        Arc::make_mut(&mut self.variables).remove(name)
    }

    /// Declare (or, with `None`, undeclare) the type of one path.
    pub fn set_declared_type(&mut self, path: &str, declared: Option<DeclaredType>) {
        match &declared {
            Some(t) => {
                self.schema.insert(path, t.clone());
            }
            None => {
                self.schema.remove(path);
            }
        }
        if let Some(cell) = self.fields.get_mut(path) {
            cell.set_declared_type(declared);
        }
    }

    // -----------------------------------------------------------------------
    // Population
    // -----------------------------------------------------------------------

    /// Drop every field, keeping schema, functions, variables, and config.
    pub fn reset(&mut self) {
        self.fields.clear();
    }

    /// Replace the fields with the flattened form of `value`.
    ///
    /// On error the record is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::NotComposite`] if `value` is not an object.
    pub fn set_data(&mut self, value: &Value) -> Result<(), StructuralError> {
        let flat = flatten(value)?;
        self.replace_fields(flat);
        Ok(())
    }

    /// Replace the fields with the flattened form of a serializable value.
    ///
    /// On error the record is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`StructuralError`] if `value` does not serialize to an
    /// object.
    pub fn set_serialize<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), StructuralError> {
        let flat = flatten_serialize(value)?;
        self.replace_fields(flat);
        Ok(())
    }

    /// Replace the fields with already-flattened entries.
    pub fn set_flat<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut flat = FlatMap::new();
        for (path, value) in entries {
            let path = path.into();
            match value.into() {
                Value::Object(map) => flatten_into(&map, Some(&path), &mut flat),
                array @ Value::Array(_) => {
                    flat.insert(path, Value::String(array.to_json_text()));
                }
                leaf => {
                    flat.insert(path, leaf);
                }
            }
        }
        self.replace_fields(flat);
    }

    fn replace_fields(&mut self, flat: FlatMap) {
        self.fields.clear();
        self.fields.reserve(flat.len());
        for (path, raw) in flat {
            let cell = match self.schema.get(&path) {
                Some(declared) => ValueCell::with_type(raw, declared.clone()),
                None => ValueCell::new(raw),
            };
            self.fields.insert(path, cell);
        }
        debug!(fields = self.fields.len(), "populated record");
    }

    fn apply_schema(&mut self) {
        for (path, cell) in &mut self.fields {
            cell.set_declared_type(self.schema.get(path).cloned());
        }
        debug!(
            declared = self.schema.len(),
            fields = self.fields.len(),
            "applied schema"
        );
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    /// The effective value at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.fields.get(path).map(ValueCell::value)
    }

    /// The cell at `path`.
    #[must_use]
    pub fn cell(&self, path: &str) -> Option<&ValueCell> {
        self.fields.get(path)
    }

    /// Returns `true` if `path` holds a field (possibly null).
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(path, cell)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueCell)> {
        self.fields.iter().map(|(path, cell)| (path.as_str(), cell))
    }

    /// Declared or inferred type of the field at `path`.
    #[must_use]
    pub fn get_type(&self, path: &str) -> Option<TypeTag> {
        self.fields.get(path).map(ValueCell::declared_or_inferred_type)
    }

    /// Returns `true` if the field at `path` is an integer.
    #[must_use]
    pub fn is_int(&self, path: &str) -> bool {
        self.get_type(path) == Some(TypeTag::Int)
    }

    /// Returns `true` if the field at `path` is a float.
    #[must_use]
    pub fn is_float(&self, path: &str) -> bool {
        self.get_type(path) == Some(TypeTag::Float)
    }

    /// Returns `true` if the field at `path` is a string.
    #[must_use]
    pub fn is_string(&self, path: &str) -> bool {
        self.get_type(path) == Some(TypeTag::String)
    }

    /// Returns `true` if the field at `path` is a boolean.
    #[must_use]
    pub fn is_bool(&self, path: &str) -> bool {
        self.get_type(path) == Some(TypeTag::Bool)
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Rebuild the nested object from the effective field values.
    #[must_use]
    pub fn to_map(&self) -> Value {
        unflatten(self.iter().map(|(path, cell)| (path, cell.value())))
    }

    /// Populate a typed value from the record.
    ///
    /// # Errors
    ///
    /// Returns a [`StructuralError`] if a field cannot be read as the type
    /// `T` expects.
    pub fn to_struct<T: DeserializeOwned>(&self) -> Result<T, StructuralError> {
        from_value(self.to_map())
    }

    /// Copy of the effective values, keyed by path.
    #[must_use]
    pub fn to_flat(&self) -> FlatMap {
        self.iter()
            .map(|(path, cell)| (path.to_owned(), cell.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    fn person() -> Value {
        Value::from(json!({
            "name": "John Doe",
            "age": 30,
            "score": "7.5",
            "active": "yes",
            "tags": ["a", "b"],
            "location": {"city": "New York"}
        }))
    }

    #[test]
    fn test_should_build_record_from_value() {
        let record = Record::from_value(&person()).unwrap();
        assert_eq!(record.len(), 6);
        assert_eq!(record.get("location.city"), Some(&Value::from("New York")));
        assert_eq!(record.get("tags"), Some(&Value::from(r#"["a","b"]"#)));
        assert_eq!(record.get("location"), None);
        assert!(record.contains("age"));
    }

    #[test]
    fn test_should_reject_non_object_data() {
        let mut record = Record::from_value(&person()).unwrap();
        assert!(record.set_data(&Value::Int(1)).is_err());
        assert_eq!(record.len(), 6);
    }

    #[test]
    fn test_should_report_declared_or_inferred_types() {
        let schema = Schema::new().with("score", "float").with("active", "bool");
        let record = Record::from_value(&person()).unwrap().with_schema(schema);
        assert!(record.is_int("age"));
        assert!(record.is_float("score"));
        assert!(record.is_bool("active"));
        assert!(record.is_string("name"));
        assert_eq!(record.get_type("tags"), Some(TypeTag::Array));
        assert_eq!(record.get_type("missing"), None);
        assert_eq!(record.get("score"), Some(&Value::Float(7.5)));
        assert_eq!(record.get("active"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_should_reapply_schema_after_set_data() {
        let mut record = Record::new().with_schema(Schema::new().with("age", "int"));
        record
            .set_data(&Value::from(json!({"age": "41"})))
            .unwrap();
        assert_eq!(record.get("age"), Some(&Value::Int(41)));
        record.reset();
        assert!(record.is_empty());
        record
            .set_data(&Value::from(json!({"age": "42"})))
            .unwrap();
        assert_eq!(record.get("age"), Some(&Value::Int(42)));
        assert_eq!(record.schema().len(), 1);
    }

    #[test]
    fn test_should_declare_type_for_single_path() {
        let mut record = Record::from_value(&person()).unwrap();
        record.set_declared_type("score", Some(DeclaredType::Float));
        assert_eq!(record.get("score"), Some(&Value::Float(7.5)));
        record.set_declared_type("score", None);
        assert_eq!(record.get("score"), Some(&Value::from("7.5")));
        assert!(record.schema().is_empty());
    }

    #[test]
    fn test_should_normalize_flat_entries() {
        let record = Record::from_flat([
            ("name", Value::from("Ann")),
            ("location", Value::from(json!({"city": "Oslo"}))),
            ("tags", Value::from(vec!["x"])),
        ]);
        assert_eq!(record.get("location.city"), Some(&Value::from("Oslo")));
        assert_eq!(record.get("tags"), Some(&Value::from(r#"["x"]"#)));
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_should_rebuild_nested_map() {
        let record = Record::from_value(&person()).unwrap();
        let map = record.to_map();
        let location = map.as_object().unwrap().get("location").unwrap();
        assert_eq!(
            location.as_object().unwrap().get("city"),
            Some(&Value::from("New York"))
        );
    }

    #[test]
    fn test_should_populate_struct() {
        #[derive(Debug, Deserialize)]
        struct Location {
            city: String,
        }
        #[derive(Debug, Deserialize)]
        struct Person {
            name: String,
            age: u8,
            score: f32,
            active: bool,
            tags: Vec<String>,
            location: Location,
            email: Option<String>,
        }
        let record = Record::from_value(&person()).unwrap();
        let person: Person = record.to_struct().unwrap();
        assert_eq!(person.name, "John Doe");
        assert_eq!(person.age, 30);
        assert!((person.score - 7.5).abs() < f32::EPSILON);
        assert!(person.active);
        assert_eq!(person.tags, vec!["a", "b"]);
        assert_eq!(person.location.city, "New York");
        assert!(person.email.is_none());
    }

    #[test]
    fn test_should_copy_on_write_shared_context() {
        let shared = Arc::new(Variables::from([("limit".to_owned(), Value::Int(1))]));
        let mut a = Record::new().with_variables(Arc::clone(&shared));
        let b = Record::new().with_variables(Arc::clone(&shared));
        a.set_variable("$limit", 2);
        assert_eq!(a.variables().get("limit"), Some(&Value::Int(2)));
        assert_eq!(b.variables().get("limit"), Some(&Value::Int(1)));
        assert_eq!(a.remove_variable("limit"), Some(Value::Int(2)));
    }

    #[test]
    fn test_should_be_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Record>();
    }
}
