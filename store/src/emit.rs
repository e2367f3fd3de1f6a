//! Emitting flattened component schemas.
//!
//! [`EmitSchema`] is a [`TypeGenerator`] whose output is the finished schema
//! itself, which is what the CLI prints. [`emit_component`] runs the
//! composer over one component of the root document.

use schema_compose_core::{
    AllOfComposer, MergeError, MergeOptions, SchemaSource, SchemaValue, TypeGenerator,
    value_with_propagated_ref,
};
use serde::Serialize;

use crate::DocumentStore;
use crate::error::{Result, StoreError};

/// A finished schema together with its naming path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedSchema {
    pub path: Vec<String>,
    pub schema: SchemaValue,
}

/// Generator that dereferences the handed-over source and returns it.
///
/// Local references inside a schema taken from another document are
/// qualified with that document, so the result resolves from the root.
#[derive(Debug, Clone, Copy)]
pub struct EmitSchema<'s> {
    store: &'s DocumentStore,
}

impl<'s> EmitSchema<'s> {
    pub fn new(store: &'s DocumentStore) -> Self {
        Self { store }
    }
}

impl TypeGenerator for EmitSchema<'_> {
    type Output = GeneratedSchema;

    fn generate(&self, source: &SchemaSource, path: &[String]) -> std::result::Result<GeneratedSchema, MergeError> {
        let schema = value_with_propagated_ref(source, self.store)?;
        Ok(GeneratedSchema {
            path: path.to_vec(),
            schema,
        })
    }
}

/// Flattens the root component `name`.
///
/// A component with an `allOf` list is merged through [`AllOfComposer`];
/// keywords written next to `allOf` are not part of the merge. Any other
/// component is emitted unchanged.
///
/// # Errors
///
/// Returns [`StoreError::UnknownComponent`] if the root document has no such
/// component, or [`StoreError::Merge`] if composition fails.
///
/// # Examples
///
/// ```
/// use schema_compose_core::MergeOptions;
/// use schema_compose_store::{DocumentStore, emit_component};
/// use serde_json::json;
///
/// let store = DocumentStore::builder()
///     .root("api.yaml", json!({"components": {"schemas": {
///         "Id": {"type": "object", "properties": {"id": {"type": "integer"}}},
///         "Pet": {"allOf": [
///             {"$ref": "#/components/schemas/Id"},
///             {"type": "object", "properties": {"name": {"type": "string"}}}
///         ]}
///     }}}))
///     .build()
///     .unwrap();
///
/// let pet = emit_component(&store, "Pet", &MergeOptions::default()).unwrap();
/// assert_eq!(pet.path, vec!["Pet"]);
/// assert!(pet.schema.all_of.is_empty());
/// assert_eq!(pet.schema.properties.len(), 2);
/// ```
pub fn emit_component(
    store: &DocumentStore,
    name: &str,
    options: &MergeOptions,
) -> Result<GeneratedSchema> {
    let schema = store
        .component(name)
        .ok_or_else(|| StoreError::UnknownComponent(name.to_string()))?;
    let path = vec![name.to_string()];

    if schema.all_of.is_empty() {
        return Ok(GeneratedSchema {
            path,
            schema: schema.clone(),
        });
    }

    let generator = EmitSchema::new(store);
    let composer = AllOfComposer::new(store, &generator, options.clone());
    Ok(composer.merge_all_of(&schema.all_of, &path)?)
}

#[cfg(test)]
mod tests {
    use schema_compose_core::{CompatibilityOptions, Resolver, SchemaType};
    use serde_json::json;

    use super::*;

    fn store() -> DocumentStore {
        DocumentStore::builder()
            .root(
                "api.yaml",
                json!({"components": {"schemas": {
                    "Base": {"type": "object", "properties": {"id": {"type": "integer"}}, "required": ["id"]},
                    "Alias": {"allOf": [{"$ref": "#/components/schemas/Base"}]},
                    "Owner": {"type": "integer"},
                    "OwnedAlias": {"allOf": [{"$ref": "common.yaml#/components/schemas/Owned"}]},
                    "Pet": {"allOf": [
                        {"$ref": "#/components/schemas/Base"},
                        {"$ref": "common.yaml#/components/schemas/Owned"}
                    ]},
                    "Broken": {"allOf": [
                        {"type": "string"},
                        {"type": "integer"}
                    ]}
                }}}),
            )
            .document(
                "common.yaml",
                json!({"components": {"schemas": {
                    "Owned": {"type": "object", "properties": {
                        "owner": {"$ref": "#/components/schemas/Owner"}
                    }},
                    "Owner": {"type": "string"}
                }}}),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_emit_plain_component() {
        let store = store();
        let base = emit_component(&store, "Base", &MergeOptions::default()).unwrap();
        assert_eq!(&base.schema, store.component("Base").unwrap());
    }

    #[test]
    fn test_emit_single_entry_all_of_dereferences() {
        let store = store();
        let alias = emit_component(&store, "Alias", &MergeOptions::default()).unwrap();
        assert_eq!(&alias.schema, store.component("Base").unwrap());
    }

    #[test]
    fn test_emit_single_external_entry_qualifies_refs() {
        let store = store();
        let alias = emit_component(&store, "OwnedAlias", &MergeOptions::default()).unwrap();

        let owner = alias.schema.properties.get("owner").unwrap();
        assert_eq!(
            owner,
            &SchemaSource::reference("common.yaml#/components/schemas/Owner")
        );
        // Must not pick up the root document's own `Owner`.
        assert_eq!(store.resolve(owner).unwrap().schema_type, Some(SchemaType::String));

        // The multi-entry path qualifies the same reference.
        let pet = emit_component(&store, "Pet", &MergeOptions::default()).unwrap();
        assert_eq!(pet.schema.properties.get("owner"), Some(owner));
    }

    #[test]
    fn test_emit_merges_and_propagates() {
        let store = store();
        let pet = emit_component(&store, "Pet", &MergeOptions::default()).unwrap();

        assert_eq!(pet.schema.schema_type, Some(SchemaType::Object));
        assert_eq!(pet.schema.required, vec!["id"]);
        assert_eq!(
            pet.schema.properties.get("owner"),
            Some(&SchemaSource::reference("common.yaml#/components/schemas/Owner"))
        );
        // The qualified reference still resolves through the store.
        let owner = pet.schema.properties.get("owner").unwrap();
        assert_eq!(store.resolve(owner).unwrap().schema_type, Some(SchemaType::String));
    }

    #[test]
    fn test_emit_conflict_surfaces_merge_error() {
        let store = store();
        let err = emit_component(&store, "Broken", &MergeOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::Merge(MergeError::AllOf { index: 1, .. })));
        assert!(err.to_string().starts_with("error merging schemas for AllOf"));
    }

    #[test]
    fn test_emit_unknown_component() {
        let store = store();
        let err = emit_component(&store, "Nope", &MergeOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::UnknownComponent(ref name) if name == "Nope"));
    }

    #[test]
    fn test_emit_legacy_switch_is_unavailable() {
        let store = store();
        let options = MergeOptions {
            compatibility: CompatibilityOptions {
                old_merge_schemas: true,
            },
        };
        let err = emit_component(&store, "Pet", &options).unwrap_err();
        assert!(matches!(err, StoreError::Merge(MergeError::LegacyMergeUnavailable)));
    }
}
