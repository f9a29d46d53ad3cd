//! Per-path declared types.

use std::collections::HashMap;
use std::collections::hash_map;

use pathstore_model::DeclaredType;
use serde::{Deserialize, Serialize};

/// Declared types keyed by flattened path.
///
/// Serializes as a plain JSON object of path to type name, e.g.
/// `{"age": "int", "score": "float"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(HashMap<String, DeclaredType>);

impl Schema {
    /// An empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, declared: impl Into<DeclaredType>) -> Self {
        self.insert(path, declared);
        self
    }

    /// Declare the type of `path`, returning the previous declaration.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        declared: impl Into<DeclaredType>,
    ) -> Option<DeclaredType> {
        self.0.insert(path.into(), declared.into())
    }

    /// The declared type of `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&DeclaredType> {
        self.0.get(path)
    }

    /// Drop the declaration for `path`.
    pub fn remove(&mut self, path: &str) -> Option<DeclaredType> {
        self.0.remove(path)
    }

    /// Number of declared paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(path, declared type)` pairs.
    pub fn iter(&self) -> hash_map::Iter<'_, String, DeclaredType> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<DeclaredType>> FromIterator<(K, V)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a String, &'a DeclaredType);
    type IntoIter = hash_map::Iter<'a, String, DeclaredType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
