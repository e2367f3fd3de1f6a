//! Reference propagation for schemas copied out of another document.
//!
//! A schema reached through an external reference (`common.yaml#/...`) may
//! itself use local references (`#/...`) that are only meaningful inside
//! `common.yaml`. Once the schema is merged into a different document those
//! references would dangle, so they are qualified with the home document's
//! path. The rewrite always happens on an owned copy; the resolver's value is
//! left untouched for every other consumer.

use tracing::trace;

use crate::error::Result;
use crate::{AdditionalProperties, Resolver, SchemaSource, SchemaValue};

/// Dereferences `source` into an owned value whose local references remain
/// valid outside the value's home document.
///
/// Inline sources and local references are returned as a plain copy.
///
/// # Errors
///
/// Returns [`UnsupportedReference`](crate::MergeError::UnsupportedReference)
/// for a malformed external reference and
/// [`MissingSchemaValue`](crate::MergeError::MissingSchemaValue) if the
/// reference resolves to nothing.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use schema_compose_core::{SchemaSource, SchemaValue, value_with_propagated_ref};
///
/// let mut schemas = HashMap::new();
/// schemas.insert(
///     "pets.yaml#/components/schemas/Pet".to_string(),
///     SchemaValue::object().with_property("tag", SchemaSource::reference("#/components/schemas/Tag")),
/// );
///
/// let pet = value_with_propagated_ref(
///     &SchemaSource::reference("pets.yaml#/components/schemas/Pet"),
///     &schemas,
/// )
/// .unwrap();
/// assert_eq!(
///     pet.properties.get("tag"),
///     Some(&SchemaSource::reference("pets.yaml#/components/schemas/Tag"))
/// );
/// ```
pub fn value_with_propagated_ref<R: Resolver + ?Sized>(
    source: &SchemaSource,
    resolver: &R,
) -> Result<SchemaValue> {
    let reference = match source {
        SchemaSource::Reference(reference) if !reference.is_local() => reference,
        _ => return resolver.resolve(source).cloned(),
    };

    let (document, _) = reference.split()?;
    let mut value = resolver.resolve(source)?.clone();

    for (name, property) in value.properties.iter_mut() {
        if qualify_local(property, document) {
            trace!(reference = %reference, property = %name, "Propagated property reference");
        }
    }
    for entry in value.all_of.iter_mut().chain(value.one_of.iter_mut()) {
        qualify_local(entry, document);
    }
    if let Some(AdditionalProperties::Schema(schema)) = value.additional_properties.as_mut() {
        qualify_local(schema, document);
    }

    Ok(value)
}

fn qualify_local(source: &mut SchemaSource, document: &str) -> bool {
    match source {
        SchemaSource::Reference(reference) if reference.is_local() => {
            *reference = reference.qualified(document);
            true
        }
        _ => false,
    }
}
