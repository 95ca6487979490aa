//! Scalar kinds and shape descriptions shared by both traversal directions.
//!
//! `ScalarKind` is the leaf of the schema model. Both the plain JSON tree and
//! the typed tree are checked against it before a scalar is copied, so a
//! `Number` field never ends up holding a string.

use crate::values::TypedValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar leaf types a schema can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// Any JSON number (integer or float)
    Number,
    /// UTF-8 string
    String,
    /// `true` / `false`
    Boolean,
}

impl ScalarKind {
    /// Name used in schema files and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }

    /// Whether a plain JSON value can be stored in a field of this kind.
    ///
    /// `null` is accepted so scalar arrays may carry holes; scalar fields
    /// filter nulls out before they get here.
    pub fn accepts_json(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::Number, Value::Number(_))
                | (Self::String, Value::String(_))
                | (Self::Boolean, Value::Bool(_))
        )
    }

    /// Whether a typed value can be projected as a field of this kind.
    pub fn accepts_typed(&self, value: &TypedValue) -> bool {
        matches!(
            (self, value),
            (_, TypedValue::Null)
                | (Self::Number, TypedValue::Number(_))
                | (Self::String, TypedValue::String(_))
                | (Self::Boolean, TypedValue::Bool(_))
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short description of a plain JSON value's runtime shape.
pub fn json_shape(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Short description of a typed value's runtime shape.
pub fn typed_shape(value: &TypedValue) -> &'static str {
    match value {
        TypedValue::Null => "null",
        TypedValue::Bool(_) => "boolean",
        TypedValue::Number(_) => "number",
        TypedValue::String(_) => "string",
        TypedValue::Array(_) => "array",
        TypedValue::Object(_) => "object",
    }
}
