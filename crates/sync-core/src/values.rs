//! Typed value tree.
//!
//! A `TypedValue` is what the synchronizer produces and the projector reads.
//! Objects carry an optional type name: `Some` for instances handed out by a
//! [`TypeFactory`](crate::TypeFactory), `None` for plain records nested inside
//! them.
//!
//! # Snapshot format
//!
//! Typed trees serialize to ordinary JSON/YAML maps. The type name of an
//! object is written under the reserved [`TYPE_TAG`] key:
//!
//! ```json
//! { "$type": "Person", "name": "Ada", "tags": ["x"] }
//! ```
//!
//! Field names starting with `$` are escaped with one extra leading `$`
//! (`$type` is written as `$$type`), so data can never collide with the tag.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Reserved snapshot key carrying an object's type name.
pub const TYPE_TAG: &str = "$type";

/// Snapshot key for a field name.
fn escape_field(name: &str) -> Cow<'_, str> {
    if name.starts_with('$') {
        Cow::Owned(format!("${name}"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Field name for a snapshot key (inverse of `escape_field`).
fn unescape_field(key: &str) -> &str {
    match key.strip_prefix('$') {
        Some(rest) if rest.starts_with('$') => rest,
        _ => key,
    }
}

/// A node in a typed value tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypedValue {
    /// Explicit null
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Number, kept as a JSON number to preserve integer/float exactness
    Number(Number),

    /// String value
    String(String),

    /// Array of typed values
    Array(Vec<TypedValue>),

    /// Typed instance or plain record
    Object(TypedObject),
}

impl TypedValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Loose truthiness used by the reconciliation policy.
    ///
    /// Null, `false`, numeric zero and the empty string are falsy. Arrays and
    /// objects are always truthy, even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => number_is_truthy(n),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) => true,
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Try to get this value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as an array.
    pub fn as_array(&self) -> Option<&Vec<TypedValue>> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to get this value as an object.
    pub fn as_object(&self) -> Option<&TypedObject> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Try to get this value as a mutable object.
    pub fn as_object_mut(&mut self) -> Option<&mut TypedObject> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Copy a plain JSON value into the typed tree without a schema.
    ///
    /// Objects become untyped records. Used for scalar copies and for
    /// registry defaults.
    pub fn from_plain(value: &Value) -> Self {
        Self::from_json(value, false)
    }

    /// Read a snapshot written by the `Serialize` impl, restoring type names.
    pub fn from_snapshot(value: &Value) -> Self {
        Self::from_json(value, true)
    }

    fn from_json(value: &Value, read_type_tag: bool) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(arr) => Self::Array(
                arr.iter()
                    .map(|v| Self::from_json(v, read_type_tag))
                    .collect(),
            ),
            Value::Object(map) => {
                let mut obj = TypedObject::record();
                for (key, v) in map {
                    if !read_type_tag {
                        obj.insert(key.clone(), Self::from_json(v, read_type_tag));
                        continue;
                    }
                    if key == TYPE_TAG {
                        if let Value::String(name) = v {
                            obj.type_name = Some(name.clone());
                            continue;
                        }
                    }
                    obj.insert(unescape_field(key), Self::from_json(v, read_type_tag));
                }
                Self::Object(obj)
            }
        }
    }

    /// Convert to plain JSON, dropping type names.
    pub fn to_plain(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(arr) => Value::Array(arr.iter().map(Self::to_plain).collect()),
            Self::Object(obj) => Value::Object(
                obj.fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_plain()))
                    .collect(),
            ),
        }
    }
}

/// Loose truthiness of a plain JSON value, matching [`TypedValue::is_truthy`].
pub fn json_is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => number_is_truthy(n),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn number_is_truthy(n: &Number) -> bool {
    n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true)
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for TypedValue {
    fn from(i: i64) -> Self {
        Self::Number(i.into())
    }
}

impl From<i32> for TypedValue {
    fn from(i: i32) -> Self {
        Self::Number(i.into())
    }
}

impl From<f64> for TypedValue {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map(Self::Number).unwrap_or(Self::Null)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<TypedObject> for TypedValue {
    fn from(obj: TypedObject) -> Self {
        Self::Object(obj)
    }
}

impl<T: Into<TypedValue>> From<Vec<T>> for TypedValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

/// An instance of a constructible type, or a plain record nested in one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedObject {
    /// Type name the instance was constructed from; `None` for plain records
    pub type_name: Option<String>,

    /// Field values (field name -> value)
    pub fields: BTreeMap<String, TypedValue>,
}

impl TypedObject {
    /// Create an empty instance of a named type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Create an empty plain record.
    pub fn record() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields.get(name)
    }

    /// Get a mutable field value by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypedValue> {
        self.fields.get_mut(name)
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: TypedValue) -> Option<TypedValue> {
        self.fields.insert(name.into(), value)
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<TypedValue> {
        self.fields.remove(name)
    }

    /// Check whether a field is present.
    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the object has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy every field of `other` over this object.
    ///
    /// Fields only present here are kept; the type name is unchanged.
    pub fn merge_shallow(&mut self, other: &TypedObject) -> &mut Self {
        for (key, value) in &other.fields {
            self.fields.insert(key.clone(), value.clone());
        }
        self
    }
}

// Snapshot serialization: objects flatten their fields and carry the type name
// under TYPE_TAG.

impl Serialize for TypedValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(obj) => obj.serialize(serializer),
        }
    }
}

impl Serialize for TypedObject {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = self.fields.len() + usize::from(self.type_name.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(name) = &self.type_name {
            map.serialize_entry(TYPE_TAG, name)?;
        }
        for (key, value) in &self.fields {
            map.serialize_entry(escape_field(key).as_ref(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TypedValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_snapshot(&value))
    }
}

impl<'de> Deserialize<'de> for TypedObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match TypedValue::deserialize(deserializer)? {
            TypedValue::Object(obj) => Ok(obj),
            other => Err(serde::de::Error::custom(format!(
                "expected an object, found {}",
                crate::types::typed_shape(&other)
            ))),
        }
    }
}
