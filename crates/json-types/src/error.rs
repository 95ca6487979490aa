//! Errors and non-fatal diagnostics raised while walking a schema.

use std::fmt;

/// Position in a tree, rendered as `$.field.nested[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// The root of the tree.
    pub fn root() -> Self {
        Self("$".to_string())
    }

    /// Path of a named child.
    pub fn child(&self, key: &str) -> Self {
        Self(format!("{}.{}", self.0, key))
    }

    /// Path of an array element.
    pub fn index(&self, idx: usize) -> Self {
        Self(format!("{}[{}]", self.0, idx))
    }

    /// Rendered path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FieldPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value's runtime shape does not fit its schema node.
///
/// Recoverable: the field is skipped and the walk continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Schema mismatch at {path}: expected {expected}, found {found}")]
pub struct SchemaMismatch {
    /// Where the mismatch happened
    pub path: FieldPath,
    /// Schema kind the value should have had
    pub expected: &'static str,
    /// Runtime shape the value actually had
    pub found: &'static str,
}

/// Mismatches collected during one `sync` or `project` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    mismatches: Vec<SchemaMismatch>,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped field.
    pub fn mismatch(&mut self, path: &FieldPath, expected: &'static str, found: &'static str) {
        let mismatch = SchemaMismatch {
            path: path.clone(),
            expected,
            found,
        };
        tracing::debug!("{mismatch}; field skipped");
        self.mismatches.push(mismatch);
    }

    /// Number of recorded mismatches.
    pub fn len(&self) -> usize {
        self.mismatches.len()
    }

    /// Check whether nothing was skipped.
    pub fn is_empty(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Iterate over recorded mismatches.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaMismatch> {
        self.mismatches.iter()
    }

    /// Paths of every skipped field.
    pub fn paths(&self) -> Vec<&str> {
        self.mismatches.iter().map(|m| m.path.as_str()).collect()
    }
}

impl IntoIterator for Diagnostics {
    type Item = SchemaMismatch;
    type IntoIter = std::vec::IntoIter<SchemaMismatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.mismatches.into_iter()
    }
}

/// Result of a successful walk: the produced value plus any skipped fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome<T> {
    /// Constructed or updated value
    pub value: T,
    /// Fields skipped because of shape mismatches
    pub diagnostics: Diagnostics,
}

impl<T> SyncOutcome<T> {
    /// Drop diagnostics and keep the value.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Fatal errors; the call is abandoned and already-applied fields stay applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The type factory has no constructor for a named type
    #[error("Cannot instantiate unknown type '{type_name}' at {path}")]
    UnknownType { type_name: String, path: FieldPath },

    /// `sync`/`project` was handed a schema that is not an object or named type
    #[error("Schema root must be an object or named type, found {found}")]
    RootNotObject { found: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_rendering() {
        let path = FieldPath::root().child("orders").index(3).child("sku");
        assert_eq!(path.to_string(), "$.orders[3].sku");
    }

    #[test]
    fn test_diagnostics_collect() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.mismatch(&FieldPath::root().child("age"), "number", "string");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.paths(), vec!["$.age"]);

        let first = diagnostics.into_iter().next().unwrap();
        assert_eq!(
            first.to_string(),
            "Schema mismatch at $.age: expected number, found string"
        );
    }
}
