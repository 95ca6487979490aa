//! Dynamic property mapping reconciliation.
//!
//! A DPM group describes a family of same-shaped sibling keys recognized by a
//! pattern. Reconciliation runs against the enclosing source and destination
//! objects in up to two steps:
//!
//! 1. delete-missing: drop destination keys whose source value is absent or falsy
//! 2. either write every matching source key ([`DpmMode::Sync`]) or, in
//!    [`DpmMode::DeleteMatching`], drop destination keys the source names and stop
//!
//! Both deletion steps only look at keys inside the policy's [`DeleteScope`].
//! Repeated calls converge the destination's key set toward the source's.

use crate::error::{Diagnostics, FieldPath, SyncError};
use crate::forward::Synchronizer;
use crate::policy::{DeleteScope, DpmMode};
use serde_json::{Map, Value};
use sync_core::{json_is_truthy, DynamicMappingSchema, TypeFactory, TypedObject, TypedValue};

impl<F: TypeFactory + ?Sized> Synchronizer<'_, F> {
    /// Reconcile one DPM group of `destination` against `source`.
    pub fn reconcile_dpm(
        &self,
        dpm: &DynamicMappingSchema,
        source: &Map<String, Value>,
        destination: &mut TypedObject,
        path: &FieldPath,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), SyncError> {
        let in_scope = |key: &str| match self.policy.delete_scope {
            DeleteScope::MatchingKeys => dpm.mapping.matches(key),
            DeleteScope::AllKeys => true,
        };

        if self.policy.delete_missing {
            let stale: Vec<String> = destination
                .keys()
                .filter(|key| in_scope(*key) && !source.get(*key).is_some_and(json_is_truthy))
                .map(str::to_string)
                .collect();
            for key in stale {
                tracing::debug!("Removing {} (missing from source)", path.child(&key));
                destination.remove(&key);
            }
        }

        match self.policy.mode() {
            DpmMode::DeleteMatching => {
                for key in source.keys() {
                    let present = destination.get(key).is_some_and(TypedValue::is_truthy);
                    if in_scope(key.as_str()) && present {
                        tracing::debug!("Removing {} (named by source)", path.child(key));
                        destination.remove(key);
                    }
                }
                Ok(())
            }
            DpmMode::Sync => {
                for (key, value) in source {
                    if value.is_null() || !dpm.mapping.matches(key) {
                        continue;
                    }
                    self.sync_slot(
                        &dpm.items,
                        value,
                        destination,
                        key,
                        &path.child(key),
                        diagnostics,
                    )?;
                }
                Ok(())
            }
        }
    }
}
