//! Reverse projection: typed tree → plain JSON.
//!
//! The projector is strictly constructive. Every call allocates a new plain
//! tree; there is nothing to reconcile against, so no policy applies.

use crate::error::{Diagnostics, FieldPath, SyncError, SyncOutcome};
use serde_json::{Map, Value};
use sync_core::{
    typed_shape, DynamicMappingSchema, PropertyDefinition, SchemaNode, TypedObject, TypedValue,
};

/// Projects typed trees back into plain JSON for serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct Projector;

impl Projector {
    /// Create a projector.
    pub fn new() -> Self {
        Self
    }

    /// Project `typed` through an object schema into a fresh JSON object.
    ///
    /// Fields the schema does not declare are dropped, as are declared fields
    /// the typed value does not hold.
    pub fn project(
        &self,
        schema: &SchemaNode,
        typed: &TypedObject,
    ) -> Result<SyncOutcome<Value>, SyncError> {
        let shape = schema.as_object().ok_or(SyncError::RootNotObject {
            found: schema.kind_name(),
        })?;
        let mut diagnostics = Diagnostics::new();
        let mut out = Map::new();
        self.project_properties(
            shape.properties,
            typed,
            &mut out,
            &FieldPath::root(),
            &mut diagnostics,
        );
        Ok(SyncOutcome {
            value: Value::Object(out),
            diagnostics,
        })
    }

    fn project_properties(
        &self,
        properties: &[PropertyDefinition],
        typed: &TypedObject,
        out: &mut Map<String, Value>,
        path: &FieldPath,
        diagnostics: &mut Diagnostics,
    ) {
        for property in properties {
            match &property.schema {
                SchemaNode::DynamicPropertyMapping(dpm) => {
                    self.project_dpm(dpm, typed, out, path, diagnostics)
                }
                node => {
                    let Some(value) = typed.get(&property.name) else {
                        continue;
                    };
                    let field_path = path.child(&property.name);
                    if let Some(plain) = self.project_value(node, value, &field_path, diagnostics) {
                        out.insert(property.name.clone(), plain);
                    }
                }
            }
        }
    }

    /// Include every key of `typed` the group's pattern matches.
    fn project_dpm(
        &self,
        dpm: &DynamicMappingSchema,
        typed: &TypedObject,
        out: &mut Map<String, Value>,
        path: &FieldPath,
        diagnostics: &mut Diagnostics,
    ) {
        for (key, value) in &typed.fields {
            if !dpm.mapping.matches(key) {
                continue;
            }
            let field_path = path.child(key);
            if let Some(plain) = self.project_value(&dpm.items, value, &field_path, diagnostics) {
                out.insert(key.clone(), plain);
            }
        }
    }

    fn project_value(
        &self,
        node: &SchemaNode,
        value: &TypedValue,
        path: &FieldPath,
        diagnostics: &mut Diagnostics,
    ) -> Option<Value> {
        match (node, value) {
            (SchemaNode::Scalar(kind), value) => {
                if kind.accepts_typed(value) {
                    Some(value.to_plain())
                } else {
                    diagnostics.mismatch(path, kind.as_str(), typed_shape(value));
                    None
                }
            }
            (_, TypedValue::Null) => Some(Value::Null),
            (SchemaNode::Object(object), TypedValue::Object(obj)) => {
                let mut out = Map::new();
                self.project_properties(&object.properties, obj, &mut out, path, diagnostics);
                Some(Value::Object(out))
            }
            (SchemaNode::NamedType(named), TypedValue::Object(obj)) => {
                let mut out = Map::new();
                let properties = &named.object.properties;
                self.project_properties(properties, obj, &mut out, path, diagnostics);
                Some(Value::Object(out))
            }
            (SchemaNode::Array(array), TypedValue::Array(elements)) => {
                let mut out = Vec::with_capacity(elements.len());
                for (idx, element) in elements.iter().enumerate() {
                    out.push(self.project_value(
                        &array.items,
                        element,
                        &path.index(idx),
                        diagnostics,
                    )?);
                }
                Some(Value::Array(out))
            }
            (SchemaNode::DynamicPropertyMapping(dpm), TypedValue::Object(obj)) => {
                let mut out = Map::new();
                self.project_dpm(dpm, obj, &mut out, path, diagnostics);
                Some(Value::Object(out))
            }
            (node, value) => {
                diagnostics.mismatch(path, node.kind_name(), typed_shape(value));
                None
            }
        }
    }
}
