//! Document loading and configuration for schema composition.
//!
//! This crate connects [`schema_compose_core`] to files on disk: it parses
//! OpenAPI / JSON Schema documents in JSON or YAML, follows external
//! references between them, and indexes every named schema so the composer
//! can dereference it.
//!
//! # Quick start
//!
//! ```no_run
//! use schema_compose_store::{ComposeConfig, DocumentStore, emit_component};
//!
//! let config = ComposeConfig::load("compose.yml").unwrap();
//! let store = DocumentStore::open_with("api/openapi.yaml", &config.documents).unwrap();
//!
//! for name in store.composed_components() {
//!     let flattened = emit_component(&store, name, &config.merge_options()).unwrap();
//!     println!("{}", serde_json::to_string_pretty(&flattened.schema).unwrap());
//! }
//! ```

mod config;
mod emit;
mod error;
mod loader;

pub use config::ComposeConfig;
pub use emit::{EmitSchema, GeneratedSchema, emit_component};
pub use error::{Result, StoreError};
pub use loader::{DocumentStore, DocumentStoreBuilder};
