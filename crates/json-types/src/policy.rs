//! Reconciliation policy for dynamic property mapping groups.

use serde::{Deserialize, Serialize};

/// Which destination keys the deletion passes may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteScope {
    /// Only keys satisfying the group's key pattern
    #[default]
    MatchingKeys,
    /// Every key of the destination object, including enumerated siblings
    AllKeys,
}

/// What a DPM group does after the delete-missing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpmMode {
    /// Write every matching source key into the destination
    Sync,
    /// Remove destination keys the source names; write nothing
    DeleteMatching,
}

/// Synchronizer-level switches; not part of any tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilePolicy {
    /// Remove destination keys whose source value is absent or falsy
    pub delete_missing: bool,

    /// Turn DPM reconciliation into a pure deletion pass
    pub delete_matching: bool,

    /// Key scope of both deletion passes
    pub delete_scope: DeleteScope,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            delete_missing: true,
            delete_matching: false,
            delete_scope: DeleteScope::default(),
        }
    }
}

impl ReconcilePolicy {
    /// Set the delete-missing switch.
    pub fn delete_missing(mut self, on: bool) -> Self {
        self.delete_missing = on;
        self
    }

    /// Set the delete-matching switch.
    pub fn delete_matching(mut self, on: bool) -> Self {
        self.delete_matching = on;
        self
    }

    /// Set the deletion key scope.
    pub fn delete_scope(mut self, scope: DeleteScope) -> Self {
        self.delete_scope = scope;
        self
    }

    /// Mode DPM groups run in under this policy.
    pub fn mode(&self) -> DpmMode {
        if self.delete_matching {
            DpmMode::DeleteMatching
        } else {
            DpmMode::Sync
        }
    }
}
