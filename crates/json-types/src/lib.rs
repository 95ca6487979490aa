//! Schema-driven mapping between plain JSON and sync-core typed trees.
//!
//! # Modules
//!
//! - [`forward`] - plain JSON → typed tree (construct or reconcile in place)
//! - [`dpm`] - dynamic property mapping reconciliation used by the forward walk
//! - [`reverse`] - typed tree → plain JSON projection
//! - [`policy`] - delete-missing / delete-matching switches
//! - [`error`] - fatal errors and per-field diagnostics
//!
//! # Example
//!
//! ```rust
//! use json_types::{project, Synchronizer};
//! use serde_json::json;
//! use sync_core::{SchemaNode, TypeRegistry};
//!
//! let schema = SchemaNode::named("Person", [("name", SchemaNode::string())]);
//! let mut registry = TypeRegistry::new();
//! registry.register_default("Person");
//!
//! // Forward: plain JSON → typed
//! let person = Synchronizer::new(&registry)
//!     .sync(&schema, &json!({ "name": "Ada", "extra": 1 }), None)
//!     .unwrap()
//!     .into_value();
//!
//! // Reverse: typed → plain JSON
//! let plain = project(&schema, &person).unwrap().into_value();
//! assert_eq!(plain, json!({ "name": "Ada" }));
//! ```

pub mod dpm;
pub mod error;
pub mod forward;
pub mod policy;
pub mod reverse;

pub use error::{Diagnostics, FieldPath, SchemaMismatch, SyncError, SyncOutcome};
pub use forward::Synchronizer;
pub use policy::{DeleteScope, DpmMode, ReconcilePolicy};
pub use reverse::Projector;

use serde_json::Value;
use sync_core::{SchemaNode, TypeFactory, TypedObject};

/// Synchronize with the default policy.
pub fn sync<F: TypeFactory + ?Sized>(
    factory: &F,
    schema: &SchemaNode,
    source: &Value,
    destination: Option<TypedObject>,
) -> Result<SyncOutcome<TypedObject>, SyncError> {
    Synchronizer::new(factory).sync(schema, source, destination)
}

/// Project a typed object into plain JSON.
pub fn project(schema: &SchemaNode, typed: &TypedObject) -> Result<SyncOutcome<Value>, SyncError> {
    Projector::new().project(schema, typed)
}
