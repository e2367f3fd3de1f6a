//! Document loading and schema indexing.
//!
//! [`DocumentStore`] parses a root OpenAPI document plus every document it
//! reaches through external `$ref`s, and indexes each addressable schema by
//! the reference string that points at it. It is the [`Resolver`] handed to
//! the composer.
//!
//! # Loading patterns
//!
//! ```no_run
//! use schema_compose_store::DocumentStore;
//!
//! // Root document plus everything it references, transitively
//! let store = DocumentStore::open("api/openapi.yaml").unwrap();
//! for name in store.component_names() {
//!     println!("{name}");
//! }
//! ```
//!
//! Document names are paths relative to the root document's directory,
//! exactly as they appear in `$ref` strings.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use schema_compose_core::{MergeError, Reference, Resolver, SchemaSource, SchemaValue};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// Places in a document where named schemas live.
const SCHEMA_CONTAINERS: [&str; 2] = ["/components/schemas", "/definitions"];

/// Indexed schemas of a root document and the documents it references.
///
/// Every schema under `components/schemas` (or `definitions`) is reachable
/// as `<document>#/components/schemas/<name>`; schemas of the root document
/// are also reachable through the local form `#/components/schemas/<name>`.
/// A document that is not itself an OpenAPI document (no `openapi`/`swagger`
/// key and no schema container) is indexed as a whole under its name.
///
/// # Examples
///
/// ```
/// use schema_compose_core::{Resolver, SchemaSource, SchemaType};
/// use schema_compose_store::DocumentStore;
/// use serde_json::json;
///
/// let store = DocumentStore::builder()
///     .root("api.yaml", json!({
///         "openapi": "3.0.3",
///         "components": {"schemas": {"Id": {"type": "integer"}}}
///     }))
///     .build()
///     .unwrap();
///
/// let local = SchemaSource::reference("#/components/schemas/Id");
/// let named = SchemaSource::reference("api.yaml#/components/schemas/Id");
/// assert_eq!(store.resolve(&local).unwrap().schema_type, Some(SchemaType::Integer));
/// assert_eq!(store.resolve(&named).unwrap(), store.resolve(&local).unwrap());
/// ```
#[derive(Debug)]
pub struct DocumentStore {
    root: String,
    documents: Vec<String>,
    schemas: HashMap<String, SchemaValue>,
    components: Vec<String>,
}

impl DocumentStore {
    /// Returns a new [`DocumentStoreBuilder`] for assembling a store from
    /// in-memory documents.
    pub fn builder() -> DocumentStoreBuilder {
        DocumentStoreBuilder::new()
    }

    /// Loads the document at `path` and every document it references.
    ///
    /// Every external `$ref` is resolved against the root document's
    /// directory, including references made from a document in a
    /// subdirectory: a `shared/common.yaml` that refers to `errors.yaml`
    /// loads `<root dir>/errors.yaml`, not `shared/errors.yaml`. Document
    /// names in the store are these root-relative paths.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReadDocument`] if a document cannot be read,
    /// [`StoreError::JsonError`] / [`StoreError::YamlError`] if one cannot be
    /// parsed, or [`StoreError::InvalidSchema`] if an indexed schema does not
    /// deserialize.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &[])
    }

    /// Like [`open`](Self::open), additionally loading `extra` documents
    /// (named relative to the root document's directory).
    pub fn open_with(path: impl AsRef<Path>, extra: &[String]) -> Result<Self> {
        let path = path.as_ref();
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let root_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut queue: VecDeque<String> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();
        for name in std::iter::once(&root_name).chain(extra) {
            let name = normalize_document(name).to_string();
            if seen.insert(name.clone()) {
                queue.push_back(name);
            }
        }

        let mut builder = DocumentStoreBuilder::new();
        while let Some(name) = queue.pop_front() {
            let value = read_document(&base_dir.join(&name))?;

            let mut references = Vec::new();
            collect_references(&value, &mut references);
            for reference in references {
                let reference = Reference::new(reference);
                let Ok((document, _)) = reference.split() else {
                    continue;
                };
                let document = normalize_document(document);
                if !document.is_empty() && seen.insert(document.to_string()) {
                    debug!(from = %name, document, "Following external reference");
                    queue.push_back(document.to_string());
                }
            }

            builder = if name == root_name {
                builder.root(name, value)
            } else {
                builder.document(name, value)
            };
        }

        builder.build()
    }

    /// Returns the name of the root document.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the names of all loaded documents, root first.
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(String::as_str)
    }

    /// Returns the number of indexed schemas (counting each addressable form
    /// separately).
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if no schema was indexed.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Returns the root document's component schema names in document order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    /// Looks up a component schema of the root document by name.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_compose_store::DocumentStore;
    /// use serde_json::json;
    ///
    /// let store = DocumentStore::builder()
    ///     .root("api.json", json!({"components": {"schemas": {"Pet": {"type": "object"}}}}))
    ///     .build()
    ///     .unwrap();
    /// assert!(store.component("Pet").is_some());
    /// assert!(store.component("Cat").is_none());
    /// ```
    pub fn component(&self, name: &str) -> Option<&SchemaValue> {
        self.components
            .iter()
            .find(|component| component.as_str() == name)
            .and_then(|component| {
                self.schemas
                    .get(&format!("#/components/schemas/{}", escape_pointer(component)))
                    .or_else(|| {
                        self.schemas
                            .get(&format!("#/definitions/{}", escape_pointer(component)))
                    })
            })
    }

    /// Returns the root component names whose schema carries an `allOf`.
    pub fn composed_components(&self) -> Vec<&str> {
        self.component_names()
            .filter(|name| self.component(name).is_some_and(|schema| !schema.all_of.is_empty()))
            .collect()
    }

    /// Returns the schema indexed under a raw reference string.
    pub fn get(&self, reference: &str) -> Option<&SchemaValue> {
        self.schemas.get(&normalize_reference(reference))
    }
}

impl Resolver for DocumentStore {
    fn resolve<'a>(&'a self, source: &'a SchemaSource) -> std::result::Result<&'a SchemaValue, MergeError> {
        match source {
            SchemaSource::Inline(value) => Ok(value),
            SchemaSource::Reference(reference) => self
                .get(reference.as_str())
                .ok_or_else(|| MergeError::MissingSchemaValue(reference.to_string())),
        }
    }
}

/// Builder for a [`DocumentStore`] from already-parsed documents.
///
/// # Example
///
/// ```
/// use schema_compose_store::DocumentStore;
/// use serde_json::json;
///
/// let store = DocumentStore::builder()
///     .root("api.yaml", json!({"openapi": "3.0.3"}))
///     .document("common.yaml", json!({
///         "components": {"schemas": {"Error": {"type": "object"}}}
///     }))
///     .build()
///     .unwrap();
/// assert!(store.get("common.yaml#/components/schemas/Error").is_some());
/// ```
#[derive(Debug, Default)]
pub struct DocumentStoreBuilder {
    root: Option<(String, Value)>,
    documents: Vec<(String, Value)>,
}

impl DocumentStoreBuilder {
    /// Creates a builder with no documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root document, against which local references resolve.
    pub fn root(mut self, name: impl Into<String>, document: Value) -> Self {
        self.root = Some((name.into(), document));
        self
    }

    /// Adds a document reachable through external references.
    pub fn document(mut self, name: impl Into<String>, document: Value) -> Self {
        self.documents.push((name.into(), document));
        self
    }

    /// Indexes every document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingRoot`] without a root document, or
    /// [`StoreError::InvalidSchema`] if an indexed schema does not
    /// deserialize.
    pub fn build(self) -> Result<DocumentStore> {
        let (root_name, root_document) = self.root.ok_or(StoreError::MissingRoot)?;
        let root_name = normalize_document(&root_name).to_string();

        let mut store = DocumentStore {
            root: root_name.clone(),
            documents: Vec::new(),
            schemas: HashMap::new(),
            components: Vec::new(),
        };

        index_document(&mut store, &root_name, &root_document, true)?;
        for (name, document) in &self.documents {
            index_document(&mut store, normalize_document(name), document, false)?;
        }

        info!(
            root = %store.root,
            documents = store.documents.len(),
            schemas = store.schemas.len(),
            "Loaded schema documents"
        );
        Ok(store)
    }
}

fn index_document(store: &mut DocumentStore, name: &str, document: &Value, is_root: bool) -> Result<()> {
    store.documents.push(name.to_string());

    let mut has_container = false;
    for container in SCHEMA_CONTAINERS {
        let Some(Value::Object(schemas)) = document.pointer(container) else {
            continue;
        };
        has_container = true;
        for (schema_name, raw) in schemas {
            let fragment = format!("{container}/{}", escape_pointer(schema_name));
            let reference = format!("{name}#{fragment}");
            let schema = parse_schema(&reference, raw)?;
            if is_root {
                store.components.push(schema_name.clone());
                store.schemas.insert(format!("#{fragment}"), schema.clone());
            }
            store.schemas.insert(reference, schema);
        }
    }

    let is_openapi = document.get("openapi").is_some() || document.get("swagger").is_some();
    if !has_container && !is_openapi && document.is_object() {
        let schema = parse_schema(name, document)?;
        store.schemas.insert(name.to_string(), schema);
    }

    debug!(document = name, root = is_root, "Indexed document");
    Ok(())
}

fn parse_schema(reference: &str, raw: &Value) -> Result<SchemaValue> {
    serde_json::from_value(raw.clone()).map_err(|err| StoreError::InvalidSchema {
        reference: reference.to_string(),
        message: err.to_string(),
    })
}

fn read_document(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path).map_err(|source| StoreError::ReadDocument {
        path: path.to_path_buf(),
        source,
    })?;
    let value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&raw)?,
        _ => serde_yaml::from_str(&raw)?,
    };
    Ok(value)
}

fn collect_references(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("$ref", Value::String(reference)) => out.push(reference.clone()),
                    _ => collect_references(child, out),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}

/// Escapes a schema name for use as a JSON pointer segment.
fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn normalize_document(document: &str) -> &str {
    document.strip_prefix("./").unwrap_or(document)
}

fn normalize_reference(reference: &str) -> String {
    match reference.split_once('#') {
        Some((document, fragment)) => format!("{}#{fragment}", normalize_document(document)),
        None => normalize_document(reference).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use schema_compose_core::SchemaType;
    use serde_json::json;

    use super::*;

    fn sample_store() -> DocumentStore {
        DocumentStore::builder()
            .root(
                "api.yaml",
                json!({
                    "openapi": "3.0.3",
                    "components": {"schemas": {
                        "Zebra": {"type": "string"},
                        "Pet": {"allOf": [
                            {"$ref": "#/components/schemas/Zebra"},
                            {"$ref": "./common.yaml#/components/schemas/Named"}
                        ]},
                        "a/b": {"type": "integer"}
                    }}
                }),
            )
            .document(
                "common.yaml",
                json!({"components": {"schemas": {
                    "Named": {"type": "object", "properties": {"name": {"type": "string"}}}
                }}}),
            )
            .document("standalone.json", json!({"type": "boolean"}))
            .build()
            .unwrap()
    }

    #[test]
    fn test_component_names_keep_document_order() {
        let store = sample_store();
        let names: Vec<&str> = store.component_names().collect();
        assert_eq!(names, vec!["Zebra", "Pet", "a/b"]);
        assert_eq!(store.composed_components(), vec!["Pet"]);
    }

    #[test]
    fn test_resolve_local_and_external_references() {
        let store = sample_store();
        let local = SchemaSource::reference("#/components/schemas/Zebra");
        assert_eq!(store.resolve(&local).unwrap().schema_type, Some(SchemaType::String));

        let external = SchemaSource::reference("./common.yaml#/components/schemas/Named");
        assert_eq!(store.resolve(&external).unwrap().schema_type, Some(SchemaType::Object));

        let whole = SchemaSource::reference("standalone.json");
        assert_eq!(store.resolve(&whole).unwrap().schema_type, Some(SchemaType::Boolean));
    }

    #[test]
    fn test_resolve_escaped_pointer() {
        let store = sample_store();
        let escaped = SchemaSource::reference("#/components/schemas/a~1b");
        assert_eq!(store.resolve(&escaped).unwrap().schema_type, Some(SchemaType::Integer));
        assert!(store.component("a/b").is_some());
    }

    #[test]
    fn test_resolve_missing_reference() {
        let store = sample_store();
        let missing = SchemaSource::reference("#/components/schemas/Nope");
        assert_eq!(
            store.resolve(&missing),
            Err(MergeError::MissingSchemaValue("#/components/schemas/Nope".to_string()))
        );
    }

    #[test]
    fn test_builder_requires_root() {
        let result = DocumentStore::builder()
            .document("common.yaml", json!({}))
            .build();
        assert!(matches!(result, Err(StoreError::MissingRoot)));
    }

    #[test]
    fn test_invalid_schema_names_reference() {
        let result = DocumentStore::builder()
            .root(
                "api.yaml",
                json!({"components": {"schemas": {"Bad": {"type": "tuple"}}}}),
            )
            .build();
        match result {
            Err(StoreError::InvalidSchema { reference, .. }) => {
                assert_eq!(reference, "api.yaml#/components/schemas/Bad");
            }
            other => panic!("expected invalid schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_collect_references_walks_nested_values() {
        let mut refs = Vec::new();
        collect_references(
            &json!({
                "a": {"$ref": "x.yaml#/a"},
                "b": [{"items": {"$ref": "#/b"}}],
                "c": {"$ref": 3}
            }),
            &mut refs,
        );
        assert_eq!(refs, vec!["x.yaml#/a", "#/b"]);
    }
}
