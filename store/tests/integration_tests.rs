use std::fs;
use std::path::Path;

use schema_compose_core::{
    AdditionalProperties, MergeError, MergeOptions, Resolver, SchemaSource, SchemaType,
};
use schema_compose_store::{ComposeConfig, DocumentStore, StoreError, emit_component};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

const ROOT_YAML: &str = r##"
openapi: 3.0.3
info:
  title: Pets
  version: "1.0"
paths: {}
components:
  schemas:
    Pet:
      allOf:
        - $ref: "#/components/schemas/Identified"
        - $ref: "common.yaml#/components/schemas/Owned"
        - type: object
          required: [name]
          properties:
            name:
              type: string
          additionalProperties: false
    Identified:
      type: object
      required: [id]
      x-go-type-name: Identified
      properties:
        id:
          type: integer
          format: int64
    Layered:
      allOf:
        - $ref: "#/components/schemas/Pet"
        - type: object
          properties:
            nickname:
              type: string
    Conflicted:
      allOf:
        - type: object
          default: {}
        - type: object
          default: {"a": 1}
"##;

const COMMON_YAML: &str = r##"
components:
  schemas:
    Owned:
      type: object
      properties:
        owner:
          $ref: "#/components/schemas/Owner"
    Owner:
      type: object
      properties:
        email:
          type: string
"##;

fn write_fixture(dir: &Path) {
    write(dir, "openapi.yaml", ROOT_YAML);
    write(dir, "common.yaml", COMMON_YAML);
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn test_open_follows_external_references() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let store = DocumentStore::open(dir.path().join("openapi.yaml")).unwrap();
    let documents: Vec<&str> = store.documents().collect();
    assert_eq!(documents, vec!["openapi.yaml", "common.yaml"]);
    assert_eq!(store.root(), "openapi.yaml");

    let names: Vec<&str> = store.component_names().collect();
    assert_eq!(names, vec!["Pet", "Identified", "Layered", "Conflicted"]);
    assert_eq!(store.composed_components(), vec!["Pet", "Layered", "Conflicted"]);
    assert!(store.get("common.yaml#/components/schemas/Owner").is_some());
}

#[test]
fn test_open_missing_external_document() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "openapi.yaml", ROOT_YAML);

    let err = DocumentStore::open(dir.path().join("openapi.yaml")).unwrap_err();
    match err {
        StoreError::ReadDocument { path, .. } => assert!(path.ends_with("common.yaml")),
        other => panic!("expected read error, got {other:?}"),
    }
}

#[test]
fn test_open_json_document() {
    let dir = tempfile::tempdir().unwrap();
    let root = serde_json::json!({
        "openapi": "3.1.0",
        "components": {"schemas": {"Count": {"type": "integer", "exclusiveMinimum": 0}}}
    });
    write(dir.path(), "api.json", &serde_json::to_string_pretty(&root).unwrap());

    let store = DocumentStore::open(dir.path().join("api.json")).unwrap();
    let count = store.component("Count").unwrap();
    assert_eq!(count.schema_type, Some(SchemaType::Integer));
    assert!(count.exclusive_minimum.is_some());
}

#[test]
fn test_open_with_extra_documents() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    write(
        dir.path(),
        "shared/errors.yaml",
        "components:\n  schemas:\n    Error:\n      type: object\n",
    );

    let config = ComposeConfig {
        documents: vec!["shared/errors.yaml".to_string()],
        ..ComposeConfig::default()
    };
    let store = DocumentStore::open_with(dir.path().join("openapi.yaml"), &config.documents).unwrap();
    let source = SchemaSource::reference("shared/errors.yaml#/components/schemas/Error");
    assert_eq!(store.resolve(&source).unwrap().schema_type, Some(SchemaType::Object));
}

#[test]
fn test_nested_document_references_are_root_relative() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "openapi.yaml",
        "openapi: 3.0.3\ncomponents:\n  schemas:\n    Reply:\n      $ref: \"shared/common.yaml#/components/schemas/Envelope\"\n",
    );
    write(
        dir.path(),
        "shared/common.yaml",
        "components:\n  schemas:\n    Envelope:\n      type: object\n      properties:\n        error:\n          $ref: \"errors.yaml#/components/schemas/Error\"\n",
    );

    // Only a sibling of the referencing document: not found.
    write(
        dir.path(),
        "shared/errors.yaml",
        "components:\n  schemas:\n    Error:\n      type: object\n",
    );
    let err = DocumentStore::open(dir.path().join("openapi.yaml")).unwrap_err();
    match err {
        StoreError::ReadDocument { path, .. } => assert_eq!(path, dir.path().join("errors.yaml")),
        other => panic!("expected read error, got {other:?}"),
    }

    write(
        dir.path(),
        "errors.yaml",
        "components:\n  schemas:\n    Error:\n      type: string\n",
    );
    let store = DocumentStore::open(dir.path().join("openapi.yaml")).unwrap();
    let documents: Vec<&str> = store.documents().collect();
    assert_eq!(documents, vec!["openapi.yaml", "shared/common.yaml", "errors.yaml"]);
    let error = store.get("errors.yaml#/components/schemas/Error").unwrap();
    assert_eq!(error.schema_type, Some(SchemaType::String));
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

#[test]
fn test_emit_flattens_across_documents() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let store = DocumentStore::open(dir.path().join("openapi.yaml")).unwrap();

    let pet = emit_component(&store, "Pet", &MergeOptions::default()).unwrap();
    let schema = pet.schema;

    assert_eq!(schema.schema_type, Some(SchemaType::Object));
    assert_eq!(schema.required, vec!["id", "name"]);
    let keys: Vec<&str> = schema.properties.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["id", "owner", "name"]);
    assert_eq!(
        schema.properties.get("owner"),
        Some(&SchemaSource::reference("common.yaml#/components/schemas/Owner"))
    );
    assert_eq!(
        schema.additional_properties,
        Some(AdditionalProperties::Allowed(false))
    );
    assert!(schema.extensions.contains_key("x-go-type-name"));

    // The shared document is untouched by propagation.
    let owned = store.get("common.yaml#/components/schemas/Owned").unwrap();
    assert_eq!(
        owned.properties.get("owner"),
        Some(&SchemaSource::reference("#/components/schemas/Owner"))
    );
}

#[test]
fn test_emit_nested_composition_is_flat() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let store = DocumentStore::open(dir.path().join("openapi.yaml")).unwrap();

    let layered = emit_component(&store, "Layered", &MergeOptions::default()).unwrap();
    assert!(layered.schema.all_of.is_empty());
    let keys: Vec<&str> = layered.schema.properties.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["id", "owner", "name", "nickname"]);
}

#[test]
fn test_emit_default_conflict() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let store = DocumentStore::open(dir.path().join("openapi.yaml")).unwrap();

    let err = emit_component(&store, "Conflicted", &MergeOptions::default()).unwrap_err();
    match err {
        StoreError::Merge(MergeError::AllOf { index, source }) => {
            assert_eq!(index, 1);
            assert!(matches!(*source, MergeError::UndefinedDefaultMerge { .. }));
        }
        other => panic!("expected allOf merge error, got {other:?}"),
    }
}

#[test]
fn test_emitted_schema_serializes_minimal() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let store = DocumentStore::open(dir.path().join("openapi.yaml")).unwrap();

    let identified = emit_component(&store, "Identified", &MergeOptions::default()).unwrap();
    let json = serde_json::to_value(&identified.schema).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "integer", "format": "int64"}},
            "x-go-type-name": "Identified"
        })
    );
}
