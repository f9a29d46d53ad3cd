//! Type tags for declared (schema) and inferred (runtime) field types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type of a field, either declared by a schema or inferred from its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Null value.
    Null,
    /// Boolean.
    Bool,
    /// Integer.
    Int,
    /// Float.
    Float,
    /// String.
    String,
    /// Array (in memory, or JSON-array text).
    Array,
    /// Map (in memory, or JSON-object text).
    Map,
    /// A declared type name the record model does not coerce to.
    Other(String),
}

impl TypeTag {
    /// Returns the tag name (e.g. `"int"`, `"map"`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Map => "map",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema-declared field type that forces coercion of the raw value.
///
/// Parsing is case-insensitive and accepts common aliases; unknown names are
/// kept as [`DeclaredType::Other`] and leave values uncoerced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeclaredType {
    /// `int`, `integer`, `int64`, `long`.
    Int,
    /// `float`, `float64`, `double`, `number`.
    Float,
    /// `string`, `str`, `text`.
    String,
    /// `bool`, `boolean`.
    Bool,
    /// Any other type name.
    Other(String),
}

impl DeclaredType {
    /// Parse a declared type name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "int64" | "long" => Self::Int,
            "float" | "float64" | "double" | "number" => Self::Float,
            "string" | "str" | "text" => Self::String,
            "bool" | "boolean" => Self::Bool,
            _ => Self::Other(name.to_owned()),
        }
    }

    /// Returns the canonical type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Other(name) => name,
        }
    }

    /// Returns `true` for the types the record model coerces to.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// The type tag reported for fields carrying this declared type.
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Int => TypeTag::Int,
            Self::Float => TypeTag::Float,
            Self::String => TypeTag::String,
            Self::Bool => TypeTag::Bool,
            Self::Other(name) => TypeTag::Other(name.clone()),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for DeclaredType {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for DeclaredType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<DeclaredType> for String {
    fn from(t: DeclaredType) -> Self {
        t.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_declared_type_aliases() {
        assert_eq!(DeclaredType::parse("INT"), DeclaredType::Int);
        assert_eq!(DeclaredType::parse("integer"), DeclaredType::Int);
        assert_eq!(DeclaredType::parse("double"), DeclaredType::Float);
        assert_eq!(DeclaredType::parse("text"), DeclaredType::String);
        assert_eq!(DeclaredType::parse("Boolean"), DeclaredType::Bool);
        assert_eq!(
            DeclaredType::parse("uuid"),
            DeclaredType::Other("uuid".to_owned())
        );
    }

    #[test]
    fn test_should_serialize_declared_type_as_name() {
        let json = serde_json::to_string(&DeclaredType::Float).unwrap();
        assert_eq!(json, r#""float""#);
        let parsed: DeclaredType = serde_json::from_str(r#""int64""#).unwrap();
        assert_eq!(parsed, DeclaredType::Int);
    }

    #[test]
    fn test_should_report_type_tag_for_other() {
        let declared = DeclaredType::parse("geo");
        assert!(!declared.is_known());
        assert_eq!(declared.type_tag().as_str(), "geo");
    }
}
