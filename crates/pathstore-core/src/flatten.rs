//! Flattening nested data into dot-joined paths, and back.
//!
//! Nested objects are walked depth first and every scalar leaf is stored at
//! the dot-joined path of its keys, so `{"location": {"city": "Oslo"}}`
//! becomes `location.city = "Oslo"`. Arrays are never split into indexed
//! paths: each array becomes one leaf holding its JSON text.
//!
//! Structs flatten through their `Serialize` impl, so serde attributes decide
//! the field names: `rename` sets the path segment, `skip` drops the field,
//! and `skip_serializing_if` omits empty values. An `Option` field that is
//! `None` and not skipped becomes an explicit null leaf.

use std::collections::{BTreeMap, HashMap};

use pathstore_model::Value;
use serde::Serialize;
use tracing::debug;

use crate::error::StructuralError;

/// Flattened path to leaf value.
pub type FlatMap = HashMap<String, Value>;

/// Flatten an object into path-keyed leaves.
///
/// Keys are visited in sorted order, so a key that already contains a dot
/// (`"a.b"`) is written after the nested path it spells (`a` → `b`) and
/// replaces it. The overwrite is logged at `debug`.
///
/// # Errors
///
/// Returns [`StructuralError::NotComposite`] if `value` is not an object.
pub fn flatten(value: &Value) -> Result<FlatMap, StructuralError> {
    let Value::Object(map) = value else {
        return Err(StructuralError::NotComposite {
            kind: value.type_tag(),
        });
    };
    let mut out = FlatMap::with_capacity(map.len());
    flatten_into(map, None, &mut out);
    Ok(out)
}

/// Flatten any serializable struct or map.
///
/// # Errors
///
/// Returns [`StructuralError::Serialize`] if serialization fails and
/// [`StructuralError::NotComposite`] if the value does not serialize to an
/// object.
pub fn flatten_serialize<T: Serialize + ?Sized>(value: &T) -> Result<FlatMap, StructuralError> {
    let json = serde_json::to_value(value).map_err(|e| StructuralError::Serialize(e.to_string()))?;
    flatten(&Value::from(json))
}

pub(crate) fn flatten_into(
    map: &BTreeMap<String, Value>,
    prefix: Option<&str>,
    out: &mut FlatMap,
) {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        let leaf = match value {
            Value::Object(nested) => {
                flatten_into(nested, Some(&path), out);
                continue;
            }
            Value::Array(_) => Value::String(value.to_json_text()),
            leaf => leaf.clone(),
        };
        if let Some(previous) = out.get(&path) {
            debug!(path = %path, previous = %previous, "dotted key overwrote a nested path");
        }
        out.insert(path, leaf);
    }
}

/// Rebuild a nested object from path-keyed leaves.
///
/// Paths are applied in sorted order. When one path is both a leaf and the
/// prefix of another (`a` and `a.b`), the first one applied wins and the
/// other is dropped.
pub fn unflatten<'a, I>(entries: I) -> Value
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut entries: Vec<_> = entries.into_iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut root = BTreeMap::new();
    for (path, value) in entries {
        if !insert_path(&mut root, path, value.clone()) {
            debug!(path, "dropping path that collides with an existing leaf");
        }
    }
    Value::Object(root)
}

/// Returns `false` when the path collides with a leaf already in place.
fn insert_path(root: &mut BTreeMap<String, Value>, path: &str, value: Value) -> bool {
    let mut segments = path.split('.').peekable();
    let mut current = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            if current.contains_key(segment) {
                return false;
            }
            current.insert(segment.to_owned(), value);
            return true;
        }
        let entry = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(BTreeMap::new()));
        match entry {
            Value::Object(next) => current = next,
            _ => return false,
        }
    }
    false
}
