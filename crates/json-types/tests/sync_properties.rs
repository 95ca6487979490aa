//! End-to-end behaviour of sync + project over schemas loaded from YAML.

use json_types::{project, DeleteScope, ReconcilePolicy, Synchronizer};
use serde_json::{json, Value};
use sync_core::{SchemaDocument, SchemaNode, TypeRegistry, TypedObject, TypedValue};

const PROFILE_SCHEMA: &str = r#"
version: 1
root:
  type: named
  type_name: Profile
  properties:
    - name: id
      type: number
    - name: handle
      type: string
    - name: verified
      type: boolean
    - name: avatar
      type: named
      type_name: Image
      properties:
        - name: url
          type: string
        - name: width
          type: number
    - name: scores
      type: array
      items:
        type: number
    - name: links
      type: array
      items:
        type: object
        properties:
          - name: rel
            type: string
          - name: href
            type: string
"#;

const SETTINGS_SCHEMA: &str = r#"
root:
  type: object
  properties:
    - name: id
      type: string
    - name: extensions
      type: dpm
      mapping: "^ext_"
      items:
        type: object
        properties:
          - name: enabled
            type: boolean
          - name: level
            type: number
"#;

fn load(yaml: &str) -> (SchemaDocument, TypeRegistry) {
    let doc = SchemaDocument::from_yaml(yaml).expect("schema should parse");
    let registry = TypeRegistry::from_document(&doc);
    (doc, registry)
}

fn profile_source() -> Value {
    json!({
        "id": 42,
        "handle": "ada",
        "verified": true,
        "avatar": { "url": "https://img/ada.png", "width": 128 },
        "scores": [3, 1, 4],
        "links": [
            { "rel": "home", "href": "https://ada.dev" },
            { "rel": "code", "href": "https://git/ada" }
        ]
    })
}

fn all_keys_dpm() -> SchemaNode {
    SchemaNode::object([(
        "values",
        SchemaNode::dpm(SchemaNode::number(), sync_core::KeyPattern::new("").unwrap()),
    )])
}

#[test]
fn sync_is_idempotent() {
    let (doc, registry) = load(PROFILE_SCHEMA);
    let sync = Synchronizer::new(&registry);
    let source = profile_source();

    let once = sync.sync(&doc.root, &source, None).unwrap().into_value();
    let twice = sync
        .sync(&doc.root, &source, Some(once.clone()))
        .unwrap()
        .into_value();

    assert_eq!(once, twice);
}

#[test]
fn sync_is_idempotent_with_dpm_groups() {
    let (doc, registry) = load(SETTINGS_SCHEMA);
    let sync = Synchronizer::new(&registry);
    let source = json!({
        "id": "s1",
        "ext_dark": { "enabled": true },
        "ext_zoom": { "level": 0 },
        "other": 1
    });

    let once = sync.sync(&doc.root, &source, None).unwrap().into_value();
    let twice = sync
        .sync(&doc.root, &source, Some(once.clone()))
        .unwrap()
        .into_value();

    assert_eq!(once, twice);
}

#[test]
fn project_after_sync_round_trips_declared_fields() {
    let (doc, registry) = load(PROFILE_SCHEMA);
    let mut source = profile_source();

    let typed = json_types::sync(&registry, &doc.root, &source, None)
        .unwrap()
        .into_value();
    let outcome = project(&doc.root, &typed).unwrap();
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(outcome.value, source);

    // Undeclared fields never survive the trip.
    source["undeclared"] = json!("dropped");
    let typed = json_types::sync(&registry, &doc.root, &source, None)
        .unwrap()
        .into_value();
    let plain = project(&doc.root, &typed).unwrap().into_value();
    assert!(plain.get("undeclared").is_none());
}

#[test]
fn absent_scalars_keep_previous_values() {
    let (doc, registry) = load(PROFILE_SCHEMA);
    let sync = Synchronizer::new(&registry);
    let existing = TypedObject::new("Profile")
        .with_field("handle", "old")
        .with_field("verified", true);

    let typed = sync
        .sync(&doc.root, &json!({ "handle": null, "id": 1 }), Some(existing))
        .unwrap()
        .into_value();

    assert_eq!(typed.get("handle"), Some(&TypedValue::from("old")));
    assert_eq!(typed.get("verified"), Some(&TypedValue::from(true)));
    assert_eq!(typed.get("id"), Some(&TypedValue::from(1)));
}

#[test]
fn dpm_delete_missing_removes_absent_keys() {
    let registry = TypeRegistry::new();
    let sync = Synchronizer::new(&registry);
    let existing = TypedObject::record()
        .with_field("a", 1)
        .with_field("b", 2);

    let typed = sync
        .sync(&all_keys_dpm(), &json!({ "b": 5 }), Some(existing))
        .unwrap()
        .into_value();

    assert_eq!(typed, TypedObject::record().with_field("b", 5));
}

#[test]
fn dpm_delete_matching_only_removes() {
    let registry = TypeRegistry::new();
    let policy = ReconcilePolicy::default().delete_matching(true);
    let sync = Synchronizer::new(&registry).with_policy(policy);
    let existing = TypedObject::record().with_field("a", 1);

    let typed = sync
        .sync(&all_keys_dpm(), &json!({ "a": 9, "c": 3 }), Some(existing))
        .unwrap()
        .into_value();

    assert!(!typed.contains_key("a"));
    assert!(!typed.contains_key("c"));
    assert!(typed.is_empty());
}

#[test]
fn arrays_are_replaced_not_merged() {
    let (doc, registry) = load(PROFILE_SCHEMA);
    let sync = Synchronizer::new(&registry);
    let existing = TypedObject::new("Profile").with_field("scores", vec![1, 2, 3]);

    let typed = sync
        .sync(&doc.root, &json!({ "scores": [9] }), Some(existing))
        .unwrap()
        .into_value();

    assert_eq!(typed.get("scores"), Some(&TypedValue::from(vec![9])));
}

#[test]
fn dpm_pattern_excludes_sibling_keys_in_both_directions() {
    let (doc, registry) = load(SETTINGS_SCHEMA);
    let sync = Synchronizer::new(&registry);

    // Forward: `id` is handled by its own property, `other` by nobody.
    let existing = TypedObject::record()
        .with_field("id", "keep-me")
        .with_field("ext_old", TypedObject::record().with_field("enabled", false));
    let typed = sync
        .sync(
            &doc.root,
            &json!({ "ext_new": { "level": 2 }, "other": true }),
            Some(existing),
        )
        .unwrap()
        .into_value();

    assert_eq!(typed.get("id"), Some(&TypedValue::from("keep-me")));
    assert!(!typed.contains_key("ext_old"));
    assert!(!typed.contains_key("other"));
    assert!(typed.contains_key("ext_new"));

    // Reverse: a non-matching key stored on the typed value is not projected by the group.
    let typed = typed.with_field("note", "internal");
    let plain = project(&doc.root, &typed).unwrap().into_value();
    assert_eq!(
        plain,
        json!({ "id": "keep-me", "ext_new": { "level": 2 } })
    );
}

#[test]
fn all_keys_scope_reproduces_full_destination_scan() {
    let (doc, registry) = load(SETTINGS_SCHEMA);
    let policy = ReconcilePolicy::default().delete_scope(DeleteScope::AllKeys);
    let sync = Synchronizer::new(&registry).with_policy(policy);

    let existing = TypedObject::record().with_field("id", "gone");
    let typed = sync
        .sync(&doc.root, &json!({ "ext_a": { "enabled": true } }), Some(existing))
        .unwrap()
        .into_value();

    assert!(!typed.contains_key("id"));
    assert!(typed.contains_key("ext_a"));
}

#[test]
fn snapshot_survives_serialization_between_calls() {
    let (doc, registry) = load(PROFILE_SCHEMA);
    let sync = Synchronizer::new(&registry);

    let typed = sync
        .sync(&doc.root, &profile_source(), None)
        .unwrap()
        .into_value();
    let snapshot = serde_json::to_string(&typed).unwrap();
    let restored: TypedObject = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(restored, typed);

    let avatar = restored
        .get("avatar")
        .and_then(TypedValue::as_object)
        .unwrap();
    assert_eq!(avatar.type_name.as_deref(), Some("Image"));

    let updated = sync
        .sync(&doc.root, &json!({ "avatar": { "width": 256 } }), Some(restored))
        .unwrap()
        .into_value();
    let avatar = updated.get("avatar").and_then(TypedValue::as_object).unwrap();
    assert_eq!(avatar.get("width"), Some(&TypedValue::from(256)));
    assert_eq!(
        avatar.get("url"),
        Some(&TypedValue::from("https://img/ada.png"))
    );
}
