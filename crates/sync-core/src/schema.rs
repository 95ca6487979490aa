//! Schema definitions for syncmap.
//!
//! A schema is a tree of [`SchemaNode`]s describing the shape both traversal
//! directions walk. Nodes are immutable once built; the traversal engines
//! never validate them, so everything that can be checked is checked here at
//! load time (currently: key patterns must compile and the root must be an
//! object).
//!
//! ## Serialized form
//!
//! Schemas are loaded from YAML or JSON. Every node is tagged by `type`:
//!
//! ```yaml
//! version: 1
//! root:
//!   type: named
//!   type_name: Person
//!   properties:
//!     - name: name
//!       type: string
//!     - name: tags
//!       type: array
//!       items:
//!         type: string
//!     - name: extensions
//!       type: dynamic_property_mapping
//!       mapping: "^ext_"
//!       items:
//!         type: number
//! types:
//!   - name: Person
//!     defaults:
//!       name: ""
//! ```

use crate::types::ScalarKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Error parsing JSON
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Key pattern of a dynamic property mapping does not compile
    #[error("Invalid key pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The document root is not an object or named type
    #[error("Schema root must be an object or named type, found {0}")]
    RootNotObject(&'static str),

    /// Named type not declared in the document
    #[error("Type not found: {0}")]
    TypeNotFound(String),
}

// ============================================================================
// Key Patterns
// ============================================================================

/// Compiled predicate deciding which keys belong to a dynamic property mapping.
#[derive(Clone)]
pub struct KeyPattern(Regex);

impl KeyPattern {
    /// Compile a key pattern.
    pub fn new(pattern: &str) -> Result<Self, SchemaError> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|source| SchemaError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Check whether a key belongs to the mapping.
    pub fn matches(&self, key: &str) -> bool {
        self.0.is_match(key)
    }

    /// Source text of the pattern.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyPattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for KeyPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for KeyPattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for KeyPattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Self::new(&pattern).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Schema Nodes
// ============================================================================

/// One named entry of an object's property list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Field name; ignored for dynamic property mappings, which match sibling keys
    pub name: String,

    /// Shape of the field
    #[serde(flatten)]
    pub schema: SchemaNode,
}

impl PropertyDefinition {
    /// Create a new property definition.
    pub fn new(name: impl Into<String>, schema: SchemaNode) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// Object with an enumerated, ordered property list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    /// Properties in traversal order
    pub properties: Vec<PropertyDefinition>,
}

impl ObjectSchema {
    /// Get a property by name.
    pub fn get_property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Get all property names.
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Object schema whose instances come from the instantiation capability.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTypeSchema {
    /// Identifier passed to the type factory
    pub type_name: String,

    /// Shape of the type's fields
    pub object: ObjectSchema,
}

/// Homogeneous array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    /// Element shape
    pub items: Box<SchemaNode>,
}

/// Family of same-shaped sibling keys recognized by a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMappingSchema {
    /// Value shape shared by every matching key
    pub items: Box<SchemaNode>,

    /// Which keys of the enclosing object belong to the group
    pub mapping: KeyPattern,
}

/// Recursive description of one position in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSchemaNode", into = "RawSchemaNode")]
pub enum SchemaNode {
    /// Number, string or boolean leaf
    Scalar(ScalarKind),

    /// Plain record with enumerated properties
    Object(ObjectSchema),

    /// Constructible type with enumerated properties
    NamedType(NamedTypeSchema),

    /// Array of `items`
    Array(ArraySchema),

    /// Pattern-matched sibling keys of the enclosing object
    DynamicPropertyMapping(DynamicMappingSchema),
}

/// Borrowed view of an object-like node.
#[derive(Debug, Clone, Copy)]
pub struct ObjectShape<'a> {
    /// `Some` for named types
    pub type_name: Option<&'a str>,
    /// Enumerated properties
    pub properties: &'a [PropertyDefinition],
}

impl ObjectShape<'_> {
    /// Kind name reported in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        if self.type_name.is_some() {
            "named"
        } else {
            "object"
        }
    }
}

impl<'a> From<&'a ObjectSchema> for ObjectShape<'a> {
    fn from(obj: &'a ObjectSchema) -> Self {
        Self {
            type_name: None,
            properties: &obj.properties,
        }
    }
}

impl<'a> From<&'a NamedTypeSchema> for ObjectShape<'a> {
    fn from(named: &'a NamedTypeSchema) -> Self {
        Self {
            type_name: Some(&named.type_name),
            properties: &named.object.properties,
        }
    }
}

impl SchemaNode {
    /// Number leaf.
    pub fn number() -> Self {
        Self::Scalar(ScalarKind::Number)
    }

    /// String leaf.
    pub fn string() -> Self {
        Self::Scalar(ScalarKind::String)
    }

    /// Boolean leaf.
    pub fn boolean() -> Self {
        Self::Scalar(ScalarKind::Boolean)
    }

    /// Plain object with the given properties, in order.
    pub fn object<I, N>(properties: I) -> Self
    where
        I: IntoIterator<Item = (N, SchemaNode)>,
        N: Into<String>,
    {
        Self::Object(ObjectSchema {
            properties: collect_properties(properties),
        })
    }

    /// Named type with the given properties, in order.
    pub fn named<I, N>(type_name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = (N, SchemaNode)>,
        N: Into<String>,
    {
        Self::NamedType(NamedTypeSchema {
            type_name: type_name.into(),
            object: ObjectSchema {
                properties: collect_properties(properties),
            },
        })
    }

    /// Array of `items`.
    pub fn array(items: SchemaNode) -> Self {
        Self::Array(ArraySchema {
            items: Box::new(items),
        })
    }

    /// Dynamic property mapping of `items` over keys matching `mapping`.
    pub fn dpm(items: SchemaNode, mapping: KeyPattern) -> Self {
        Self::DynamicPropertyMapping(DynamicMappingSchema {
            items: Box::new(items),
            mapping,
        })
    }

    /// Kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(kind) => kind.as_str(),
            Self::Object(_) => "object",
            Self::NamedType(_) => "named",
            Self::Array(_) => "array",
            Self::DynamicPropertyMapping(_) => "dynamic_property_mapping",
        }
    }

    /// View an `Object` or `NamedType` node as an object shape.
    pub fn as_object(&self) -> Option<ObjectShape<'_>> {
        match self {
            Self::Object(obj) => Some(obj.into()),
            Self::NamedType(named) => Some(named.into()),
            _ => None,
        }
    }

    /// Every named type referenced in this subtree, in first-seen order.
    pub fn named_types(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_named_types(&mut names);
        names
    }

    fn collect_named_types<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Scalar(_) => {}
            Self::Object(obj) => {
                for property in &obj.properties {
                    property.schema.collect_named_types(names);
                }
            }
            Self::NamedType(named) => {
                if !names.contains(&named.type_name.as_str()) {
                    names.push(&named.type_name);
                }
                for property in &named.object.properties {
                    property.schema.collect_named_types(names);
                }
            }
            Self::Array(array) => array.items.collect_named_types(names),
            Self::DynamicPropertyMapping(dpm) => dpm.items.collect_named_types(names),
        }
    }
}

fn collect_properties<I, N>(properties: I) -> Vec<PropertyDefinition>
where
    I: IntoIterator<Item = (N, SchemaNode)>,
    N: Into<String>,
{
    properties
        .into_iter()
        .map(|(name, schema)| PropertyDefinition::new(name, schema))
        .collect()
}

/// Tagged wire form of [`SchemaNode`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawSchemaNode {
    Number,
    String,
    Boolean,
    Object {
        #[serde(default)]
        properties: Vec<PropertyDefinition>,
    },
    Named {
        type_name: String,
        #[serde(default)]
        properties: Vec<PropertyDefinition>,
    },
    Array {
        items: Box<SchemaNode>,
    },
    #[serde(alias = "dpm")]
    DynamicPropertyMapping {
        items: Box<SchemaNode>,
        mapping: KeyPattern,
    },
}

impl From<RawSchemaNode> for SchemaNode {
    fn from(raw: RawSchemaNode) -> Self {
        match raw {
            RawSchemaNode::Number => Self::number(),
            RawSchemaNode::String => Self::string(),
            RawSchemaNode::Boolean => Self::boolean(),
            RawSchemaNode::Object { properties } => Self::Object(ObjectSchema { properties }),
            RawSchemaNode::Named {
                type_name,
                properties,
            } => Self::NamedType(NamedTypeSchema {
                type_name,
                object: ObjectSchema { properties },
            }),
            RawSchemaNode::Array { items } => Self::Array(ArraySchema { items }),
            RawSchemaNode::DynamicPropertyMapping { items, mapping } => {
                Self::DynamicPropertyMapping(DynamicMappingSchema { items, mapping })
            }
        }
    }
}

impl From<SchemaNode> for RawSchemaNode {
    fn from(node: SchemaNode) -> Self {
        match node {
            SchemaNode::Scalar(ScalarKind::Number) => Self::Number,
            SchemaNode::Scalar(ScalarKind::String) => Self::String,
            SchemaNode::Scalar(ScalarKind::Boolean) => Self::Boolean,
            SchemaNode::Object(obj) => Self::Object {
                properties: obj.properties,
            },
            SchemaNode::NamedType(named) => Self::Named {
                type_name: named.type_name,
                properties: named.object.properties,
            },
            SchemaNode::Array(array) => Self::Array { items: array.items },
            SchemaNode::DynamicPropertyMapping(dpm) => Self::DynamicPropertyMapping {
                items: dpm.items,
                mapping: dpm.mapping,
            },
        }
    }
}

// ============================================================================
// Schema Documents
// ============================================================================

fn default_version() -> u32 {
    1
}

/// Default field values for a named type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Type name as referenced by `named` nodes
    pub name: String,

    /// Field values a fresh instance starts with
    #[serde(default)]
    pub defaults: serde_json::Map<String, serde_json::Value>,
}

/// A schema file: the root object schema plus optional type declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Object or named type traversed by `sync`/`project`
    pub root: SchemaNode,

    /// Declared named types
    #[serde(default)]
    pub types: Vec<TypeDefinition>,

    /// Cached type lookup (not serialized)
    #[serde(skip)]
    type_map: HashMap<String, usize>,
}

impl SchemaDocument {
    /// Create a document around a root schema.
    pub fn new(root: SchemaNode, types: Vec<TypeDefinition>) -> Result<Self, SchemaError> {
        let mut doc = Self {
            version: default_version(),
            root,
            types,
            type_map: HashMap::new(),
        };
        doc.finish()?;
        Ok(doc)
    }

    /// Load a document from a file; `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parse a document from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let mut doc: SchemaDocument = serde_yaml::from_str(yaml)?;
        doc.finish()?;
        Ok(doc)
    }

    /// Parse a document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let mut doc: SchemaDocument = serde_json::from_str(json)?;
        doc.finish()?;
        Ok(doc)
    }

    fn finish(&mut self) -> Result<(), SchemaError> {
        if self.root.as_object().is_none() {
            return Err(SchemaError::RootNotObject(self.root.kind_name()));
        }
        self.type_map = self
            .types
            .iter()
            .enumerate()
            .map(|(idx, ty)| (ty.name.clone(), idx))
            .collect();
        tracing::debug!(
            "Loaded schema v{} with {} declared types",
            self.version,
            self.types.len()
        );
        Ok(())
    }

    /// Get a declared type by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.type_map.get(name).and_then(|&idx| self.types.get(idx))
    }

    /// Get the declared defaults of a type.
    pub fn get_defaults(
        &self,
        name: &str,
    ) -> Result<&serde_json::Map<String, serde_json::Value>, SchemaError> {
        self.get_type(name)
            .map(|ty| &ty.defaults)
            .ok_or_else(|| SchemaError::TypeNotFound(name.to_string()))
    }

    /// Every named type referenced by the root schema.
    pub fn named_types(&self) -> Vec<&str> {
        self.root.named_types()
    }
}

// ============================================================================
// Tests
// ============================================================================
