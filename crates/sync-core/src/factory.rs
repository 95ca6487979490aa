//! Instantiation capability.
//!
//! The synchronizer never resolves type names on its own; it asks a
//! [`TypeFactory`] supplied by the host. [`TypeRegistry`] is the stock
//! implementation, and any `Fn(&str) -> Option<TypedObject>` closure works too.

use crate::schema::SchemaDocument;
use crate::values::{TypedObject, TypedValue};
use std::collections::HashMap;
use std::fmt;

/// The factory has no constructor for a type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown type: {0}")]
pub struct UnknownType(pub String);

/// Produces fresh, default-constructed instances of named types.
pub trait TypeFactory {
    /// Return a new instance of `type_name`.
    fn instantiate(&self, type_name: &str) -> Result<TypedObject, UnknownType>;
}

impl<F> TypeFactory for F
where
    F: Fn(&str) -> Option<TypedObject>,
{
    fn instantiate(&self, type_name: &str) -> Result<TypedObject, UnknownType> {
        self(type_name).ok_or_else(|| UnknownType(type_name.to_string()))
    }
}

type Constructor = Box<dyn Fn() -> TypedObject + Send + Sync>;

/// Explicit name -> constructor registry.
#[derive(Default)]
pub struct TypeRegistry {
    constructors: HashMap<String, Constructor>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor, replacing any previous one for the same name.
    pub fn register<F>(&mut self, type_name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> TypedObject + Send + Sync + 'static,
    {
        self.constructors
            .insert(type_name.into(), Box::new(constructor));
        self
    }

    /// Register a type whose fresh instances have no fields.
    pub fn register_default(&mut self, type_name: impl Into<String>) -> &mut Self {
        let type_name = type_name.into();
        let name = type_name.clone();
        self.register(type_name, move || TypedObject::new(name.clone()))
    }

    /// Register a type whose fresh instances are clones of `prototype`.
    ///
    /// The prototype's type name is overwritten with `type_name`.
    pub fn register_prototype(
        &mut self,
        type_name: impl Into<String>,
        mut prototype: TypedObject,
    ) -> &mut Self {
        let type_name = type_name.into();
        prototype.type_name = Some(type_name.clone());
        self.register(type_name, move || prototype.clone())
    }

    /// Check whether a type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// All registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a registry covering every named type a document references.
    ///
    /// Types declared under `types` start from their `defaults`; the rest
    /// start empty.
    pub fn from_document(doc: &SchemaDocument) -> Self {
        let mut registry = Self::new();
        for name in doc.named_types() {
            match doc.get_type(name) {
                Some(ty) => registry.register_prototype(name, prototype_from(&ty.defaults)),
                None => registry.register_default(name),
            };
        }
        // Declared but unreferenced types are still constructible.
        for ty in &doc.types {
            if !registry.contains(&ty.name) {
                registry.register_prototype(ty.name.clone(), prototype_from(&ty.defaults));
            }
        }
        tracing::debug!("Type registry built with {} types", registry.constructors.len());
        registry
    }
}

fn prototype_from(defaults: &serde_json::Map<String, serde_json::Value>) -> TypedObject {
    let mut prototype = TypedObject::record();
    for (key, value) in defaults {
        prototype.insert(key.clone(), TypedValue::from_plain(value));
    }
    prototype
}

impl TypeFactory for TypeRegistry {
    fn instantiate(&self, type_name: &str) -> Result<TypedObject, UnknownType> {
        self.constructors
            .get(type_name)
            .map(|constructor| constructor())
            .ok_or_else(|| UnknownType(type_name.to_string()))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}
