//! Schema composition engine for OpenAPI `allOf`.
//!
//! Given the ordered members of an `allOf` list, this crate produces one
//! flattened schema equivalent to their conjunction, ready for type
//! generation:
//!
//! - [`SchemaValue`] / [`SchemaSource`]: the schema object model, with
//!   [`OrderedMap`] keeping property and extension order stable.
//! - [`value_with_propagated_ref`]: dereferences a source and qualifies the
//!   local references of schemas pulled in from other documents.
//! - [`merge_schemas`]: field-by-field merge of two schemas; conflicting or
//!   undefined combinations fail with a [`MergeError`].
//! - [`flatten_all_of`]: collapses nested `allOf` lists.
//! - [`AllOfComposer`]: folds a whole `allOf` list and hands the result to a
//!   [`TypeGenerator`].
//!
//! Dereferencing is delegated to a [`Resolver`].
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use schema_compose_core::*;
//!
//! let mut schemas = HashMap::new();
//! schemas.insert(
//!     "#/components/schemas/Base".to_string(),
//!     SchemaValue::object()
//!         .with_property("id", SchemaValue::of_type(SchemaType::Integer).with_format("int64"))
//!         .with_required("id"),
//! );
//!
//! let all_of = [
//!     SchemaSource::reference("#/components/schemas/Base"),
//!     SchemaValue::object()
//!         .with_property("name", SchemaValue::of_type(SchemaType::String))
//!         .into(),
//! ];
//! let merged = flatten_all_of(&all_of, &schemas).unwrap();
//! assert_eq!(merged.required, vec!["id"]);
//! assert_eq!(merged.properties.keys().collect::<Vec<_>>(), vec!["id", "name"]);
//! ```

mod compose;
mod error;
mod merge;
mod ordered_map;
mod propagate;
mod resolve;
mod types;

pub use compose::{AllOfComposer, CompatibilityOptions, MergeOptions, TypeGenerator};
pub use error::{BoundDialect, BoundField, MergeError, Result, SchemaFlag, Side};
pub use merge::{MAX_COMPOSITION_DEPTH, MergeContext, flatten_all_of, merge_schemas};
pub use ordered_map::OrderedMap;
pub use propagate::value_with_propagated_ref;
pub use resolve::Resolver;
pub use types::*;
