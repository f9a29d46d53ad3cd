//! Lenient, type-directed deserialization out of [`Value`] trees.
//!
//! Records store scalars loosely: numbers may arrive as text, arrays are kept
//! as JSON text, and persisted rows are text throughout. [`ValueDeserializer`]
//! lets the target type decide how to read each leaf:
//!
//! - numeric targets accept ints, floats, numeric strings, and booleans
//! - `bool` targets accept the same text set as [`crate::cell::to_bool`]
//! - sequence targets accept arrays and JSON-array text
//! - struct and map targets accept objects and JSON-object text
//! - string targets accept any scalar in its canonical text form
//! - null reads as `None`, an empty string, or an empty sequence or map

use std::collections::BTreeMap;
use std::fmt;

use pathstore_model::Value;
use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{
    DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, Error as _, IntoDeserializer,
    Unexpected, VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;

use crate::cell::{to_bool, to_float64, to_int64};
use crate::error::StructuralError;

/// Deserialize `T` from a value tree with lenient scalar coercion.
///
/// # Errors
///
/// Returns a [`StructuralError`] when a leaf cannot be read as the type the
/// target expects.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, StructuralError> {
    T::deserialize(ValueDeserializer::new(value))
}

/// A `serde::Deserializer` over an owned [`Value`].
#[derive(Debug)]
pub struct ValueDeserializer {
    value: Value,
    path: String,
}

impl ValueDeserializer {
    /// Deserializer for a root value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            value,
            path: String::new(),
        }
    }

    fn child(value: Value, path: String) -> Self {
        Self { value, path }
    }

    fn error(&self, e: impl fmt::Display) -> StructuralError {
        if self.path.is_empty() {
            StructuralError::Deserialize(e.to_string())
        } else {
            StructuralError::Deserialize(format!("{}: {e}", self.path))
        }
    }

    fn parse_text(&self, text: &str) -> Result<Value, StructuralError> {
        Value::from_json_text(text).map_err(|e| StructuralError::InvalidJson {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl<'de> IntoDeserializer<'de, StructuralError> for ValueDeserializer {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

macro_rules! deserialize_integer {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                let n = to_int64(&self.value).map_err(|e| self.error(e))?;
                visitor.visit_i64(n)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for ValueDeserializer {
    type Error = StructuralError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Int(i) => visitor.visit_i64(i),
            Value::Float(f) => visitor.visit_f64(f),
            Value::String(s) => visitor.visit_string(s),
            Value::Array(items) => visit_array(items, &self.path, visitor),
            Value::Object(map) => visit_object(map, &self.path, visitor),
        }
    }

    deserialize_integer! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let b = to_bool(&self.value).map_err(|e| self.error(e))?;
        visitor.visit_bool(b)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let f = to_float64(&self.value).map_err(|e| self.error(e))?;
        visitor.visit_f64(f)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            other => visitor.visit_string(other.to_string()),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if self.value.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Array(items) => visit_array(items, &self.path, visitor),
            Value::Null => visit_array(Vec::new(), &self.path, visitor),
            Value::String(ref text) if text.trim().is_empty() => {
                visit_array(Vec::new(), &self.path, visitor)
            }
            Value::String(ref text) => match self.parse_text(text)? {
                Value::Array(items) => visit_array(items, &self.path, visitor),
                other => Err(self.error(format_args!(
                    "expected JSON array text, got {}",
                    other.type_tag()
                ))),
            },
            ref other => Err(StructuralError::invalid_type(unexpected(other), &visitor)),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Object(map) => visit_object(map, &self.path, visitor),
            Value::Null => visit_object(BTreeMap::new(), &self.path, visitor),
            Value::String(ref text) => match self.parse_text(text)? {
                Value::Object(map) => visit_object(map, &self.path, visitor),
                other => Err(self.error(format_args!(
                    "expected JSON object text, got {}",
                    other.type_tag()
                ))),
            },
            ref other => Err(StructuralError::invalid_type(unexpected(other), &visitor)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let path = self.path;
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
                path,
            }),
            Value::Object(map) => {
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((variant, value)), None) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                        path,
                    }),
                    _ => Err(StructuralError::invalid_value(
                        Unexpected::Map,
                        &"map with a single key",
                    )),
                }
            }
            other => Err(StructuralError::invalid_type(unexpected(&other), &visitor)),
        }
    }

    forward_to_deserialize_any! {
        i128 u128 bytes byte_buf unit unit_struct ignored_any
    }
}

fn child_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_owned()
    } else {
        format!("{parent}.{segment}")
    }
}

fn visit_array<'de, V: Visitor<'de>>(
    items: Vec<Value>,
    path: &str,
    visitor: V,
) -> Result<V::Value, StructuralError> {
    let mut access: SeqDeserializer<_, StructuralError> = SeqDeserializer::new(
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| ValueDeserializer::child(item, format!("{path}[{i}]"))),
    );
    let out = visitor.visit_seq(&mut access)?;
    access.end()?;
    Ok(out)
}

fn visit_object<'de, V: Visitor<'de>>(
    map: BTreeMap<String, Value>,
    path: &str,
    visitor: V,
) -> Result<V::Value, StructuralError> {
    let mut access: MapDeserializer<'de, _, StructuralError> =
        MapDeserializer::new(map.into_iter().map(|(key, value)| {
            let child = child_path(path, &key);
            (
                ValueDeserializer::child(Value::String(key), child.clone()),
                ValueDeserializer::child(value, child),
            )
        }));
    let out = visitor.visit_map(&mut access)?;
    access.end()?;
    Ok(out)
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Int(i) => Unexpected::Signed(*i),
        Value::Float(f) => Unexpected::Float(*f),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
    path: String,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = StructuralError;
    type Variant = VariantDeserializer;

    fn variant_seed<S: DeserializeSeed<'de>>(
        self,
        seed: S,
    ) -> Result<(S::Value, Self::Variant), Self::Error> {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((
            variant,
            VariantDeserializer {
                value: self.value,
                path: self.path,
            },
        ))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
    path: String,
}

impl VariantDeserializer {
    fn into_value_deserializer(self) -> ValueDeserializer {
        ValueDeserializer::child(self.value.unwrap_or_default(), self.path)
    }
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = StructuralError;

    fn unit_variant(self) -> Result<(), Self::Error> {
        match self.value {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(StructuralError::invalid_type(
                unexpected(&other),
                &"unit variant",
            )),
        }
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value, Self::Error> {
        seed.deserialize(self.into_value_deserializer())
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error> {
        self.into_value_deserializer().deserialize_seq(visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.into_value_deserializer().deserialize_map(visitor)
    }
}
