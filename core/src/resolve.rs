//! Dereferencing capability used by the merger.

use std::collections::HashMap;

use crate::error::{MergeError, Result};
use crate::{SchemaSource, SchemaValue};

/// Looks up the schema a [`SchemaSource`] stands for.
///
/// Inline sources resolve to themselves. References resolve to a value owned
/// by the resolver, which may be shared by many referring sources, so callers
/// clone before changing anything.
///
/// A plain `HashMap` keyed by the full `$ref` string is a resolver:
///
/// ```
/// use std::collections::HashMap;
/// use schema_compose_core::{Resolver, SchemaSource, SchemaType, SchemaValue};
///
/// let mut schemas = HashMap::new();
/// schemas.insert(
///     "#/components/schemas/Name".to_string(),
///     SchemaValue::of_type(SchemaType::String),
/// );
///
/// let source = SchemaSource::reference("#/components/schemas/Name");
/// assert_eq!(schemas.resolve(&source).unwrap().schema_type, Some(SchemaType::String));
/// assert!(schemas.resolve(&SchemaSource::reference("#/missing")).is_err());
/// ```
pub trait Resolver {
    /// Dereferences `source`.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::MissingSchemaValue`] if a reference points at
    /// nothing.
    fn resolve<'a>(&'a self, source: &'a SchemaSource) -> Result<&'a SchemaValue>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve<'a>(&'a self, source: &'a SchemaSource) -> Result<&'a SchemaValue> {
        (**self).resolve(source)
    }
}

impl Resolver for HashMap<String, SchemaValue> {
    fn resolve<'a>(&'a self, source: &'a SchemaSource) -> Result<&'a SchemaValue> {
        match source {
            SchemaSource::Inline(value) => Ok(value),
            SchemaSource::Reference(reference) => self
                .get(reference.as_str())
                .ok_or_else(|| MergeError::MissingSchemaValue(reference.to_string())),
        }
    }
}
