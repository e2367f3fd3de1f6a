//! `allOf` orchestration: fold a list of schema sources into one schema and
//! hand it to a type generator.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MergeError, Result};
use crate::merge::{MergeContext, merge_schemas};
use crate::{Resolver, SchemaSource, SchemaValue, value_with_propagated_ref};

/// Switches kept for compatibility with earlier merge behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityOptions {
    /// Route `allOf` merges to the generator's legacy algorithm instead of
    /// this engine.
    #[serde(default)]
    pub old_merge_schemas: bool,
}

/// Options controlling an [`AllOfComposer`].
///
/// # Examples
///
/// ```
/// use schema_compose_core::MergeOptions;
///
/// let options: MergeOptions =
///     serde_json::from_str(r#"{"compatibility": {"old_merge_schemas": true}}"#).unwrap();
/// assert!(options.compatibility.old_merge_schemas);
/// assert!(!MergeOptions::default().compatibility.old_merge_schemas);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    #[serde(default)]
    pub compatibility: CompatibilityOptions,
}

/// Turns a finished schema into the caller's output representation.
///
/// `path` is the naming context of the schema being generated and is passed
/// through untouched.
pub trait TypeGenerator {
    type Output;

    /// Generates output for a single schema source.
    fn generate(&self, source: &SchemaSource, path: &[String]) -> Result<Self::Output>;

    /// Runs the legacy `allOf` algorithm, used when
    /// [`CompatibilityOptions::old_merge_schemas`] is set.
    ///
    /// Generators without one fail with
    /// [`MergeError::LegacyMergeUnavailable`].
    fn generate_legacy_all_of(
        &self,
        sources: &[SchemaSource],
        path: &[String],
    ) -> Result<Self::Output> {
        let _ = (sources, path);
        Err(MergeError::LegacyMergeUnavailable)
    }
}

/// Merges `allOf` lists and forwards the result to a [`TypeGenerator`].
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use schema_compose_core::*;
///
/// struct Emit;
///
/// impl TypeGenerator for Emit {
///     type Output = SchemaSource;
///
///     fn generate(&self, source: &SchemaSource, _path: &[String]) -> Result<SchemaSource, MergeError> {
///         Ok(source.clone())
///     }
/// }
///
/// let mut schemas = HashMap::new();
/// schemas.insert(
///     "#/components/schemas/Named".to_string(),
///     SchemaValue::object().with_property("name", SchemaValue::of_type(SchemaType::String)),
/// );
///
/// let composer = AllOfComposer::new(&schemas, &Emit, MergeOptions::default());
/// let merged = composer
///     .merge_all_of(
///         &[
///             SchemaSource::reference("#/components/schemas/Named"),
///             SchemaValue::object().with_property("age", SchemaValue::of_type(SchemaType::Integer)).into(),
///         ],
///         &["Person".to_string()],
///     )
///     .unwrap();
///
/// match merged {
///     SchemaSource::Inline(value) => assert_eq!(value.properties.len(), 2),
///     SchemaSource::Reference(_) => unreachable!(),
/// }
/// ```
pub struct AllOfComposer<'a, R: ?Sized, G: ?Sized> {
    resolver: &'a R,
    generator: &'a G,
    options: MergeOptions,
}

impl<'a, R, G> AllOfComposer<'a, R, G>
where
    R: Resolver + ?Sized,
    G: TypeGenerator + ?Sized,
{
    /// Creates a composer over `resolver` and `generator`.
    pub fn new(resolver: &'a R, generator: &'a G, options: MergeOptions) -> Self {
        Self {
            resolver,
            generator,
            options,
        }
    }

    /// Merges `sources` as an `allOf` conjunction and generates the result.
    ///
    /// A single source is dereferenced and then passed to the generator
    /// as-is, keeping its reference. Otherwise every source is dereferenced
    /// with reference propagation and folded left to right.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::EmptyComposition`] for an empty list,
    /// [`MergeError::AllOf`] wrapping the first merge failure, or any
    /// dereferencing or generation error.
    pub fn merge_all_of(&self, sources: &[SchemaSource], path: &[String]) -> Result<G::Output> {
        if self.options.compatibility.old_merge_schemas {
            debug!(path = ?path, "Using legacy allOf merge");
            return self.generator.generate_legacy_all_of(sources, path);
        }

        match sources {
            [] => Err(MergeError::EmptyComposition),
            [single] => {
                self.resolver.resolve(single)?;
                self.generator.generate(single, path)
            }
            _ => {
                let merged = self.fold(sources)?;
                self.generator.generate(&SchemaSource::from(merged), path)
            }
        }
    }

    fn fold(&self, sources: &[SchemaSource]) -> Result<SchemaValue> {
        let (first, rest) = sources
            .split_first()
            .ok_or(MergeError::EmptyComposition)?;

        let mut schema = value_with_propagated_ref(first, self.resolver)?;
        for (offset, source) in rest.iter().enumerate() {
            let index = offset + 1;
            let next = value_with_propagated_ref(source, self.resolver)?;
            debug!(index, "Merging allOf entry");
            schema = merge_schemas(&schema, &next, MergeContext::AllOf, self.resolver).map_err(
                |err| MergeError::AllOf {
                    index,
                    source: Box::new(err),
                },
            )?;
        }
        Ok(schema)
    }
}
