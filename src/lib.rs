//! syncmap library
//!
//! Schema-driven synchronization between plain JSON data and typed object
//! trees. The heavy lifting lives in the workspace crates:
//!
//! - `sync_core` - schema model, typed values, type registry
//! - `json_types` - forward synchronizer, DPM reconciliation, reverse projector
//!
//! This crate adds the file handling, configuration and option parsing used
//! by the `syncmap` binary.
//!
//! # CLI Usage
//!
//! ```bash
//! # Build a typed tree from raw data
//! syncmap sync --schema person.yaml --input person.json --output person.typed.json
//!
//! # Refine an existing typed tree, deleting DPM keys across the whole object
//! syncmap sync --schema person.yaml --input update.json \
//!   --existing person.typed.json --delete-scope all-keys
//!
//! # Project a typed tree back to plain JSON
//! syncmap project --schema person.yaml --input person.typed.json
//!
//! # List named types and DPM groups in a schema
//! syncmap inspect --schema person.yaml
//! ```

use clap::Parser;
use json_types::{DeleteScope, ReconcilePolicy};

pub mod commands;
pub mod config;

pub use commands::{
    describe_schema, emit_outcome, read_data, read_typed, report_diagnostics, run_project,
    run_sync, write_output, SchemaSummary,
};
pub use config::{parse_delete_scope, OutputConfig, SyncmapConfig};

/// Command-line overrides for the DPM reconciliation policy.
#[derive(Parser, Clone, Debug, Default)]
pub struct ReconcileOpts {
    /// Remove DPM keys missing from the source
    #[arg(
        long,
        env = "SYNCMAP_DELETE_MISSING",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub delete_missing: Option<bool>,

    /// Only delete DPM keys the source names; write nothing
    #[arg(
        long,
        env = "SYNCMAP_DELETE_MATCHING",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub delete_matching: Option<bool>,

    /// Which keys DPM deletions may touch (matching-keys or all-keys)
    #[arg(long, env = "SYNCMAP_DELETE_SCOPE", value_parser = parse_scope_arg)]
    pub delete_scope: Option<DeleteScope>,
}

fn parse_scope_arg(s: &str) -> Result<DeleteScope, String> {
    parse_delete_scope(s).map_err(|e| e.to_string())
}

impl ReconcileOpts {
    /// Apply the overrides on top of a base policy.
    pub fn apply(&self, base: ReconcilePolicy) -> ReconcilePolicy {
        let mut policy = base;
        if let Some(on) = self.delete_missing {
            policy = policy.delete_missing(on);
        }
        if let Some(on) = self.delete_matching {
            policy = policy.delete_matching(on);
        }
        if let Some(scope) = self.delete_scope {
            policy = policy.delete_scope(scope);
        }
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_overrides_keep_base() {
        let base = ReconcilePolicy::default().delete_scope(DeleteScope::AllKeys);
        assert_eq!(ReconcileOpts::default().apply(base), base);
    }

    #[test]
    fn test_overrides_win() {
        let opts = ReconcileOpts::try_parse_from([
            "test",
            "--delete-missing",
            "false",
            "--delete-matching",
            "--delete-scope",
            "all-keys",
        ])
        .unwrap();

        let policy = opts.apply(ReconcilePolicy::default());
        assert!(!policy.delete_missing);
        assert!(policy.delete_matching);
        assert_eq!(policy.delete_scope, DeleteScope::AllKeys);
    }
}
