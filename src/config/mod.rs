//! Configuration for the syncmap CLI.
//!
//! Settings come from an optional TOML file; command-line flags override the
//! file, and built-in defaults fill whatever neither sets.
//!
//! ```toml
//! [reconcile]
//! delete_missing = true
//! delete_matching = false
//! delete_scope = "matching_keys"
//!
//! [output]
//! pretty = true
//! ```

mod scope;

pub use scope::parse_delete_scope;

use anyhow::Context;
use json_types::ReconcilePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output formatting settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Contents of a syncmap configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncmapConfig {
    /// Reconciliation policy for dynamic property mappings
    pub reconcile: ReconcilePolicy,

    /// Output formatting
    pub output: OutputConfig,
}

impl SyncmapConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path:?}"))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config file {path:?}"))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: SyncmapConfig = toml::from_str(content)?;
        tracing::debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    /// Load the file when a path is given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
