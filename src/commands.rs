//! File-level operations behind the `syncmap` subcommands.
//!
//! Each function loads its inputs, runs one traversal and hands back the
//! outcome; printing and exit codes stay in the binary.

use anyhow::Context;
use json_types::{Diagnostics, Projector, ReconcilePolicy, SyncOutcome, Synchronizer};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use sync_core::{PropertyDefinition, SchemaDocument, SchemaNode, TypeRegistry, TypedObject};

/// Read plain data from a JSON or YAML file (chosen by extension).
pub fn read_data(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {path:?}"))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yaml" | "yml"));
    if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {path:?}"))
    } else {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {path:?}"))
    }
}

/// Read a typed snapshot previously written by `syncmap sync`.
pub fn read_typed(path: &Path) -> anyhow::Result<TypedObject> {
    let value = read_data(path)?;
    serde_json::from_value(value)
        .with_context(|| format!("Typed snapshot {path:?} must be an object"))
}

fn load_schema(path: &Path) -> anyhow::Result<SchemaDocument> {
    SchemaDocument::from_file(path)
        .with_context(|| format!("Failed to load schema from {path:?}"))
}

/// Build or refine a typed tree from a plain data file.
pub fn run_sync(
    schema_path: &Path,
    input_path: &Path,
    existing_path: Option<&Path>,
    policy: ReconcilePolicy,
) -> anyhow::Result<SyncOutcome<TypedObject>> {
    let doc = load_schema(schema_path)?;
    let registry = TypeRegistry::from_document(&doc);
    let source = read_data(input_path)?;
    let existing = existing_path.map(read_typed).transpose()?;

    tracing::info!(
        "Synchronizing {:?} ({} existing destination)",
        input_path,
        if existing.is_some() { "with" } else { "without" }
    );
    tracing::debug!("Reconcile policy: {:?}", policy);

    let outcome = Synchronizer::new(&registry)
        .with_policy(policy)
        .sync(&doc.root, &source, existing)
        .with_context(|| format!("Failed to synchronize {input_path:?}"))?;
    Ok(outcome)
}

/// Project a typed snapshot back to plain JSON.
pub fn run_project(schema_path: &Path, input_path: &Path) -> anyhow::Result<SyncOutcome<Value>> {
    let doc = load_schema(schema_path)?;
    let typed = read_typed(input_path)?;

    tracing::info!("Projecting {:?}", input_path);
    let outcome = Projector::new()
        .project(&doc.root, &typed)
        .with_context(|| format!("Failed to project {input_path:?}"))?;
    Ok(outcome)
}

/// Serialize a value as JSON to a file, or to stdout when no path is given.
pub fn write_output<T: Serialize>(
    value: &T,
    output: Option<&Path>,
    pretty: bool,
) -> anyhow::Result<()> {
    let mut rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    rendered.push('\n');

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write output file {path:?}"))?;
            tracing::info!("Wrote {:?}", path);
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Print skipped fields as warnings on stderr.
pub fn report_diagnostics(diagnostics: &Diagnostics) {
    for mismatch in diagnostics.iter() {
        eprintln!("warning: {mismatch}");
    }
}

/// Report diagnostics, then write the outcome's value.
///
/// With `fail_on_mismatch`, any diagnostic is an error and nothing is written.
pub fn emit_outcome<T: Serialize>(
    outcome: &SyncOutcome<T>,
    output: Option<&Path>,
    pretty: bool,
    fail_on_mismatch: bool,
) -> anyhow::Result<()> {
    report_diagnostics(&outcome.diagnostics);
    if fail_on_mismatch && !outcome.diagnostics.is_empty() {
        anyhow::bail!("{} field(s) did not match the schema", outcome.diagnostics.len());
    }
    write_output(&outcome.value, output, pretty)
}

/// What a schema declares, for `syncmap inspect`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaSummary {
    /// Schema version
    pub version: u32,
    /// Every named type referenced, in first-seen order
    pub named_types: Vec<String>,
    /// Types declared with defaults
    pub declared_types: Vec<String>,
    /// DPM groups as (enclosing object path, key pattern)
    pub dpm_groups: Vec<(String, String)>,
}

/// Summarize a schema file.
pub fn describe_schema(schema_path: &Path) -> anyhow::Result<SchemaSummary> {
    let doc = load_schema(schema_path)?;
    let mut dpm_groups = Vec::new();
    collect_dpm_groups(&doc.root, "$", &mut dpm_groups);

    Ok(SchemaSummary {
        version: doc.version,
        named_types: doc.named_types().into_iter().map(String::from).collect(),
        declared_types: doc.types.iter().map(|ty| ty.name.clone()).collect(),
        dpm_groups,
    })
}

fn collect_dpm_groups(node: &SchemaNode, path: &str, out: &mut Vec<(String, String)>) {
    match node {
        SchemaNode::Scalar(_) => {}
        SchemaNode::Object(object) => collect_property_groups(&object.properties, path, out),
        SchemaNode::NamedType(named) => {
            collect_property_groups(&named.object.properties, path, out)
        }
        SchemaNode::Array(array) => collect_dpm_groups(&array.items, &format!("{path}[]"), out),
        SchemaNode::DynamicPropertyMapping(dpm) => {
            out.push((path.to_string(), dpm.mapping.as_str().to_string()));
            collect_dpm_groups(&dpm.items, &format!("{path}.*"), out);
        }
    }
}

fn collect_property_groups(
    properties: &[PropertyDefinition],
    path: &str,
    out: &mut Vec<(String, String)>,
) {
    for property in properties {
        match &property.schema {
            SchemaNode::DynamicPropertyMapping(dpm) => {
                out.push((path.to_string(), dpm.mapping.as_str().to_string()));
                collect_dpm_groups(&dpm.items, &format!("{path}.*"), out);
            }
            child => collect_dpm_groups(child, &format!("{path}.{}", property.name), out),
        }
    }
}
