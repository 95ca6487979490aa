//! File-level behaviour of the functions behind `syncmap sync/project/inspect`.

use json_types::{DeleteScope, ReconcilePolicy};
use serde_json::json;
use std::path::{Path, PathBuf};
use sync_core::TypedValue;
use syncmap::{
    describe_schema, emit_outcome, read_typed, run_project, run_sync, write_output,
    ReconcileOpts, SyncmapConfig,
};
use tempfile::TempDir;

const CATALOG_SCHEMA: &str = r#"
version: 2
root:
  type: named
  type_name: Catalog
  properties:
    - name: title
      type: string
    - name: owner
      type: named
      type_name: Person
      properties:
        - name: name
          type: string
    - name: labels
      type: dynamic_property_mapping
      mapping: "^label_"
      items:
        type: string
types:
  - name: Person
    defaults:
      name: anonymous
"#;

const BAG_SCHEMA: &str = r#"
root:
  type: named
  type_name: Bag
  properties:
    - name: entries
      type: dpm
      mapping: ""
      items:
        type: string
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn schema(dir: &TempDir) -> PathBuf {
    write(dir, "catalog.yaml", CATALOG_SCHEMA)
}

fn sync_to_file(
    schema: &Path,
    input: &Path,
    existing: Option<&Path>,
    policy: ReconcilePolicy,
    out: &Path,
) {
    let outcome = run_sync(schema, input, existing, policy).unwrap();
    write_output(&outcome.value, Some(out), true).unwrap();
}

#[test]
fn test_sync_then_project_through_files() {
    let dir = TempDir::new().unwrap();
    let schema = schema(&dir);
    let input = write(
        &dir,
        "input.json",
        r#"{"title": "Books", "owner": {"name": "Ada"}, "label_a": "x", "extra": 1}"#,
    );
    let typed_path = dir.path().join("typed.json");

    sync_to_file(&schema, &input, None, ReconcilePolicy::default(), &typed_path);

    let typed = read_typed(&typed_path).unwrap();
    assert_eq!(typed.type_name.as_deref(), Some("Catalog"));
    let owner = typed.get("owner").and_then(TypedValue::as_object).unwrap();
    assert_eq!(owner.type_name.as_deref(), Some("Person"));

    let projected = run_project(&schema, &typed_path).unwrap();
    assert!(projected.diagnostics.is_empty());
    assert_eq!(
        projected.value,
        json!({"title": "Books", "owner": {"name": "Ada"}, "label_a": "x"})
    );
}

#[test]
fn test_declared_defaults_seed_new_instances() {
    let dir = TempDir::new().unwrap();
    let schema = schema(&dir);
    let input = write(&dir, "input.json", r#"{"owner": {}}"#);

    let outcome = run_sync(&schema, &input, None, ReconcilePolicy::default()).unwrap();
    let owner = outcome
        .value
        .get("owner")
        .and_then(TypedValue::as_object)
        .unwrap();
    assert_eq!(owner.get("name"), Some(&TypedValue::from("anonymous")));
}

#[test]
fn test_existing_snapshot_is_refined() {
    let dir = TempDir::new().unwrap();
    let schema = schema(&dir);
    let first = write(
        &dir,
        "first.json",
        r#"{"title": "Books", "label_a": "x", "label_b": "y"}"#,
    );
    let typed_path = dir.path().join("typed.json");
    sync_to_file(&schema, &first, None, ReconcilePolicy::default(), &typed_path);

    let second = write(&dir, "second.yaml", "label_b: z\n");
    let outcome = run_sync(
        &schema,
        &second,
        Some(&typed_path),
        ReconcilePolicy::default(),
    )
    .unwrap();

    let typed = outcome.value;
    assert_eq!(typed.get("title"), Some(&TypedValue::from("Books")));
    assert!(!typed.contains_key("label_a"));
    assert_eq!(typed.get("label_b"), Some(&TypedValue::from("z")));
}

#[test]
fn test_mismatches_are_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let schema = schema(&dir);
    let input = write(&dir, "input.json", r#"{"title": 7}"#);

    let outcome = run_sync(&schema, &input, None, ReconcilePolicy::default()).unwrap();
    assert_eq!(outcome.diagnostics.paths(), vec!["$.title"]);
    assert!(!outcome.value.contains_key("title"));
}

#[test]
fn test_fail_on_mismatch_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let schema = schema(&dir);
    let input = write(&dir, "input.json", r#"{"title": 7, "label_a": "x"}"#);
    let out = dir.path().join("typed.json");

    let outcome = run_sync(&schema, &input, None, ReconcilePolicy::default()).unwrap();
    assert_eq!(outcome.diagnostics.len(), 1);

    let err = emit_outcome(&outcome, Some(&out), true, true).unwrap_err();
    assert!(err.to_string().contains("1 field(s) did not match"));
    assert!(!out.exists());

    emit_outcome(&outcome, Some(&out), true, false).unwrap();
    let typed = read_typed(&out).unwrap();
    assert_eq!(typed.get("label_a"), Some(&TypedValue::from("x")));
    assert!(!typed.contains_key("title"));
}

#[test]
fn test_dollar_fields_survive_snapshot_files() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "bag.yaml", BAG_SCHEMA);
    let input = write(&dir, "input.json", r#"{"$type": "Evil", "a": "x"}"#);
    let typed_path = dir.path().join("typed.json");
    sync_to_file(&schema, &input, None, ReconcilePolicy::default(), &typed_path);

    let typed = read_typed(&typed_path).unwrap();
    assert_eq!(typed.type_name.as_deref(), Some("Bag"));
    assert_eq!(typed.get("$type"), Some(&TypedValue::from("Evil")));

    let projected = run_project(&schema, &typed_path).unwrap();
    assert_eq!(projected.value, json!({"$type": "Evil", "a": "x"}));
}

#[test]
fn test_missing_files_carry_context() {
    let dir = TempDir::new().unwrap();
    let schema = schema(&dir);
    let missing = dir.path().join("nope.json");

    let err = run_sync(&schema, &missing, None, ReconcilePolicy::default()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read input file"));

    let err = describe_schema(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to load schema"));
}

#[test]
fn test_describe_schema() {
    let dir = TempDir::new().unwrap();
    let summary = describe_schema(&schema(&dir)).unwrap();

    assert_eq!(summary.version, 2);
    assert_eq!(summary.named_types, vec!["Catalog", "Person"]);
    assert_eq!(summary.declared_types, vec!["Person"]);
    assert_eq!(
        summary.dpm_groups,
        vec![("$".to_string(), "^label_".to_string())]
    );
}

#[test]
fn test_config_file_and_flags_combine() {
    let dir = TempDir::new().unwrap();
    let config_path = write(
        &dir,
        "syncmap.toml",
        "[reconcile]\ndelete_missing = false\ndelete_scope = \"all_keys\"\n\n[output]\npretty = false\n",
    );

    let config = SyncmapConfig::load(Some(&config_path)).unwrap();
    assert!(!config.output.pretty);
    assert!(!config.reconcile.delete_missing);

    let opts = ReconcileOpts {
        delete_missing: Some(true),
        ..Default::default()
    };
    let policy = opts.apply(config.reconcile);
    assert!(policy.delete_missing);
    assert!(!policy.delete_matching);
    assert_eq!(policy.delete_scope, DeleteScope::AllKeys);
}
