//! Forward synchronization: plain JSON → typed tree.
//!
//! [`Synchronizer`] walks a schema in lock-step with a plain JSON value and an
//! optional existing typed object. Nested objects are refined in place,
//! arrays are always rebuilt, and dynamic property mapping groups are
//! reconciled according to the synchronizer's [`ReconcilePolicy`].
//!
//! Absent or null source values never clear anything: scalars keep their old
//! value and nested objects are left alone. Only DPM groups delete.

use crate::error::{Diagnostics, FieldPath, SyncError, SyncOutcome};
use crate::policy::{DeleteScope, ReconcilePolicy};
use serde_json::{Map, Value};
use sync_core::{
    json_shape, ObjectShape, PropertyDefinition, SchemaNode, TypeFactory, TypedObject, TypedValue,
};

/// Builds and updates typed trees from plain JSON.
///
/// Holds no per-call state; the policy is the only configuration.
pub struct Synchronizer<'a, F: TypeFactory + ?Sized> {
    pub(crate) factory: &'a F,
    pub(crate) policy: ReconcilePolicy,
}

impl<'a, F: TypeFactory + ?Sized> Synchronizer<'a, F> {
    /// Create a synchronizer with the default policy.
    pub fn new(factory: &'a F) -> Self {
        Self {
            factory,
            policy: ReconcilePolicy::default(),
        }
    }

    /// Replace the policy.
    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current policy.
    pub fn policy(&self) -> &ReconcilePolicy {
        &self.policy
    }

    /// Toggle delete-missing.
    pub fn set_delete_missing(&mut self, on: bool) {
        self.policy.delete_missing = on;
    }

    /// Toggle delete-matching.
    pub fn set_delete_matching(&mut self, on: bool) {
        self.policy.delete_matching = on;
    }

    /// Set the key scope of the DPM deletion passes.
    pub fn set_delete_scope(&mut self, scope: DeleteScope) {
        self.policy.delete_scope = scope;
    }

    /// Synchronize `source` into `destination`, constructing it when `None`.
    ///
    /// A fresh root comes from the type factory for named types and is an
    /// empty record for plain objects.
    pub fn sync(
        &self,
        schema: &SchemaNode,
        source: &Value,
        destination: Option<TypedObject>,
    ) -> Result<SyncOutcome<TypedObject>, SyncError> {
        let shape = schema.as_object().ok_or(SyncError::RootNotObject {
            found: schema.kind_name(),
        })?;
        let mut value = match destination {
            Some(existing) => existing,
            None => self.new_instance(shape.type_name, &FieldPath::root())?,
        };
        let diagnostics = self.sync_into(schema, source, &mut value)?;
        Ok(SyncOutcome { value, diagnostics })
    }

    /// Reconcile an exclusively borrowed destination against `source`.
    ///
    /// On error, fields applied before the failure stay applied.
    pub fn sync_into(
        &self,
        schema: &SchemaNode,
        source: &Value,
        destination: &mut TypedObject,
    ) -> Result<Diagnostics, SyncError> {
        let shape = schema.as_object().ok_or(SyncError::RootNotObject {
            found: schema.kind_name(),
        })?;
        let root = FieldPath::root();
        let mut diagnostics = Diagnostics::new();

        match source.as_object() {
            Some(map) => {
                self.sync_properties(shape.properties, map, destination, &root, &mut diagnostics)?
            }
            None => diagnostics.mismatch(&root, "object", json_shape(source)),
        }

        tracing::debug!(
            "Synchronized {} properties ({} skipped)",
            shape.properties.len(),
            diagnostics.len()
        );
        Ok(diagnostics)
    }

    pub(crate) fn sync_properties(
        &self,
        properties: &[PropertyDefinition],
        source: &Map<String, Value>,
        destination: &mut TypedObject,
        path: &FieldPath,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), SyncError> {
        for property in properties {
            match &property.schema {
                // Operates on the siblings of the enclosing object, not on a nested key.
                SchemaNode::DynamicPropertyMapping(dpm) => {
                    self.reconcile_dpm(dpm, source, destination, path, diagnostics)?
                }
                node => match source.get(&property.name) {
                    None | Some(Value::Null) => {}
                    Some(value) => self.sync_slot(
                        node,
                        value,
                        destination,
                        &property.name,
                        &path.child(&property.name),
                        diagnostics,
                    )?,
                },
            }
        }
        Ok(())
    }

    /// Write `destination[key]` from a non-null source value.
    pub(crate) fn sync_slot(
        &self,
        node: &SchemaNode,
        value: &Value,
        destination: &mut TypedObject,
        key: &str,
        path: &FieldPath,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), SyncError> {
        match node {
            SchemaNode::Scalar(kind) => {
                if kind.accepts_json(value) {
                    destination.insert(key, TypedValue::from_plain(value));
                } else {
                    diagnostics.mismatch(path, kind.as_str(), json_shape(value));
                }
            }
            SchemaNode::Object(object) => {
                self.sync_object_slot(object.into(), value, destination, key, path, diagnostics)?
            }
            SchemaNode::NamedType(named) => {
                self.sync_object_slot(named.into(), value, destination, key, path, diagnostics)?
            }
            SchemaNode::Array(array) => {
                if let Some(items) = self.build_array(&array.items, value, path, diagnostics)? {
                    destination.insert(key, TypedValue::Array(items));
                }
            }
            SchemaNode::DynamicPropertyMapping(dpm) => {
                let Some(map) = value.as_object() else {
                    diagnostics.mismatch(path, node.kind_name(), json_shape(value));
                    return Ok(());
                };
                self.update_object_slot(destination, key, None, path, |obj| {
                    self.reconcile_dpm(dpm, map, obj, path, diagnostics)
                })?;
            }
        }
        Ok(())
    }

    fn sync_object_slot(
        &self,
        shape: ObjectShape<'_>,
        value: &Value,
        destination: &mut TypedObject,
        key: &str,
        path: &FieldPath,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), SyncError> {
        let Some(map) = value.as_object() else {
            diagnostics.mismatch(path, shape.kind_name(), json_shape(value));
            return Ok(());
        };
        self.update_object_slot(destination, key, shape.type_name, path, |obj| {
            self.sync_properties(shape.properties, map, obj, path, diagnostics)
        })
    }

    /// Refine `destination[key]` in place, or build and insert a fresh object.
    fn update_object_slot<G>(
        &self,
        destination: &mut TypedObject,
        key: &str,
        type_name: Option<&str>,
        path: &FieldPath,
        update: G,
    ) -> Result<(), SyncError>
    where
        G: FnOnce(&mut TypedObject) -> Result<(), SyncError>,
    {
        if let Some(TypedValue::Object(existing)) = destination.get_mut(key) {
            return update(existing);
        }
        let mut fresh = self.new_instance(type_name, path)?;
        update(&mut fresh)?;
        destination.insert(key, TypedValue::Object(fresh));
        Ok(())
    }

    /// Build a new typed array from `value`.
    ///
    /// Returns `None` when the value or any element has the wrong shape; the
    /// whole array field is then skipped. Elements are never reconciled
    /// against a previous array.
    pub fn build_array(
        &self,
        items: &SchemaNode,
        value: &Value,
        path: &FieldPath,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Vec<TypedValue>>, SyncError> {
        let Some(elements) = value.as_array() else {
            diagnostics.mismatch(path, "array", json_shape(value));
            return Ok(None);
        };

        let mut typed = Vec::with_capacity(elements.len());
        for (idx, element) in elements.iter().enumerate() {
            let element_path = path.index(idx);
            match items {
                SchemaNode::Scalar(kind) => {
                    if !kind.accepts_json(element) {
                        diagnostics.mismatch(&element_path, kind.as_str(), json_shape(element));
                        return Ok(None);
                    }
                    typed.push(TypedValue::from_plain(element));
                }
                SchemaNode::Array(inner) => {
                    match self.build_array(&inner.items, element, &element_path, diagnostics)? {
                        Some(nested) => typed.push(TypedValue::Array(nested)),
                        None => return Ok(None),
                    }
                }
                SchemaNode::Object(object) => {
                    match self.build_object(object.into(), element, &element_path, diagnostics)? {
                        Some(fresh) => typed.push(TypedValue::Object(fresh)),
                        None => return Ok(None),
                    }
                }
                SchemaNode::NamedType(named) => {
                    match self.build_object(named.into(), element, &element_path, diagnostics)? {
                        Some(fresh) => typed.push(TypedValue::Object(fresh)),
                        None => return Ok(None),
                    }
                }
                SchemaNode::DynamicPropertyMapping(dpm) => {
                    let Some(map) = element.as_object() else {
                        diagnostics.mismatch(&element_path, items.kind_name(), json_shape(element));
                        return Ok(None);
                    };
                    let mut fresh = TypedObject::record();
                    self.reconcile_dpm(dpm, map, &mut fresh, &element_path, diagnostics)?;
                    typed.push(TypedValue::Object(fresh));
                }
            }
        }
        Ok(Some(typed))
    }

    /// Build a fresh object from an array element; `None` on a shape mismatch.
    fn build_object(
        &self,
        shape: ObjectShape<'_>,
        value: &Value,
        path: &FieldPath,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<TypedObject>, SyncError> {
        let Some(map) = value.as_object() else {
            diagnostics.mismatch(path, shape.kind_name(), json_shape(value));
            return Ok(None);
        };
        let mut fresh = self.new_instance(shape.type_name, path)?;
        self.sync_properties(shape.properties, map, &mut fresh, path, diagnostics)?;
        Ok(Some(fresh))
    }

    fn new_instance(
        &self,
        type_name: Option<&str>,
        path: &FieldPath,
    ) -> Result<TypedObject, SyncError> {
        match type_name {
            None => Ok(TypedObject::record()),
            Some(name) => self
                .factory
                .instantiate(name)
                .map_err(|err| SyncError::UnknownType {
                    type_name: err.0,
                    path: path.clone(),
                }),
        }
    }
}
