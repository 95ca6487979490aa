//! Core types for syncmap.
//!
//! This crate provides the foundational types shared by both traversal
//! directions:
//!
//! - [`SchemaNode`] - Declarative description of a tree shape
//! - [`SchemaDocument`] - Schema files loaded from YAML or JSON
//! - [`TypedValue`] / [`TypedObject`] - The strongly-typed object tree
//! - [`TypeFactory`] / [`TypeRegistry`] - The injected "instantiate type by name" capability
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    └─── json-types   (plain JSON → typed sync, typed → plain JSON projection)
//!            │
//!            └─── syncmap   (CLI)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sync_core::{SchemaNode, TypeFactory, TypeRegistry};
//!
//! let schema = SchemaNode::named("Person", [("name", SchemaNode::string())]);
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_default("Person");
//!
//! let person = registry.instantiate("Person").unwrap();
//! assert_eq!(person.type_name.as_deref(), Some("Person"));
//! assert!(schema.as_object().is_some());
//! ```

pub mod factory;
pub mod schema;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use factory::{TypeFactory, TypeRegistry, UnknownType};
pub use schema::{
    ArraySchema, DynamicMappingSchema, KeyPattern, NamedTypeSchema, ObjectSchema, ObjectShape,
    PropertyDefinition, SchemaDocument, SchemaError, SchemaNode, TypeDefinition,
};
pub use types::{json_shape, typed_shape, ScalarKind};
pub use values::{json_is_truthy, TypedObject, TypedValue, TYPE_TAG};
