//! Pairwise schema merging and transitive `allOf` flattening.
//!
//! [`merge_schemas`] combines two dereferenced schemas into one whose
//! constraints are the conjunction of both. Each field has its own rule:
//! some fields concatenate, some must agree exactly, and combinations with
//! no defined meaning (two defaults, two `additionalProperties` schemas) fail
//! instead of guessing.
//!
//! Any input that carries its own `allOf` is first collapsed with
//! [`flatten_all_of`], so nested composition never survives into the
//! field-level comparison.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use schema_compose_core::*;
//!
//! let resolver: HashMap<String, SchemaValue> = HashMap::new();
//! let name = SchemaValue::object()
//!     .with_property("name", SchemaValue::of_type(SchemaType::String))
//!     .with_required("name");
//! let age = SchemaValue::object()
//!     .with_property("age", SchemaValue::of_type(SchemaType::Integer))
//!     .with_required("age");
//!
//! let merged = merge_schemas(&name, &age, MergeContext::AllOf, &resolver).unwrap();
//! assert_eq!(merged.required, vec!["name", "age"]);
//! assert_eq!(merged.properties.len(), 2);
//! ```

use std::borrow::Cow;

use tracing::debug;

use crate::error::{BoundDialect, BoundField, MergeError, Result, SchemaFlag, Side};
use crate::{
    AdditionalProperties, ExclusiveBound, Resolver, SchemaSource, SchemaValue,
    value_with_propagated_ref,
};

/// Maximum nesting of `allOf` lists followed while flattening.
///
/// `depth` counts `allOf` lists, one per nesting level, whether the nested
/// list is reached through a lone entry or a pairwise merge. Cyclic
/// composition would otherwise recurse without bound.
pub const MAX_COMPOSITION_DEPTH: usize = 64;

/// Kind of composition a merge is performed for.
///
/// Both contexts currently apply identical rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeContext {
    /// Merging the members of an `allOf` list.
    #[default]
    AllOf,
    /// Merging for any other composition keyword.
    Composition,
}

/// Merges two dereferenced schemas field by field.
///
/// # Errors
///
/// Returns the first field conflict found, or
/// [`MergeError::TransitiveFlatten`] if either input's nested `allOf` cannot
/// be flattened.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use schema_compose_core::*;
///
/// let resolver: HashMap<String, SchemaValue> = HashMap::new();
/// let text = SchemaValue::of_type(SchemaType::String);
/// let number = SchemaValue::of_type(SchemaType::Integer);
///
/// let err = merge_schemas(&text, &number, MergeContext::AllOf, &resolver).unwrap_err();
/// assert!(matches!(err, MergeError::IncompatibleTypes { .. }));
/// ```
pub fn merge_schemas<R: Resolver + ?Sized>(
    s1: &SchemaValue,
    s2: &SchemaValue,
    context: MergeContext,
    resolver: &R,
) -> Result<SchemaValue> {
    merge_at_depth(s1, s2, context, resolver, 0)
}

/// Collapses an `allOf` list into a single equivalent schema.
///
/// Entries are dereferenced (with reference propagation) and folded left to
/// right with [`merge_schemas`] in [`MergeContext::AllOf`].
///
/// # Errors
///
/// Returns [`MergeError::EmptyComposition`] for an empty list,
/// [`MergeError::CompositionTooDeep`] past [`MAX_COMPOSITION_DEPTH`], and any
/// dereferencing or merge failure of the entries.
pub fn flatten_all_of<R: Resolver + ?Sized>(
    entries: &[SchemaSource],
    resolver: &R,
) -> Result<SchemaValue> {
    flatten_at_depth(entries, resolver, 0)
}

fn flatten_at_depth<R: Resolver + ?Sized>(
    entries: &[SchemaSource],
    resolver: &R,
    depth: usize,
) -> Result<SchemaValue> {
    if depth >= MAX_COMPOSITION_DEPTH {
        return Err(MergeError::CompositionTooDeep {
            limit: MAX_COMPOSITION_DEPTH,
        });
    }
    let (first, rest) = entries
        .split_first()
        .ok_or(MergeError::EmptyComposition)?;
    debug!(entries = entries.len(), depth, "Flattening nested allOf");

    let mut merged = value_with_propagated_ref(first, resolver)?;
    // A lone entry never reaches the pairwise merge, so collapse its own
    // composition here.
    if !merged.all_of.is_empty() {
        merged = flatten_at_depth(&merged.all_of, resolver, depth + 1)?;
    }
    for entry in rest {
        let next = value_with_propagated_ref(entry, resolver)?;
        merged = merge_at_depth(&merged, &next, MergeContext::AllOf, resolver, depth)?;
    }
    Ok(merged)
}

fn expand<'s, R: Resolver + ?Sized>(
    schema: &'s SchemaValue,
    side: Side,
    resolver: &R,
    depth: usize,
) -> Result<Cow<'s, SchemaValue>> {
    if schema.all_of.is_empty() {
        return Ok(Cow::Borrowed(schema));
    }
    flatten_at_depth(&schema.all_of, resolver, depth + 1)
        .map(Cow::Owned)
        .map_err(|err| MergeError::TransitiveFlatten {
            side,
            source: Box::new(err),
        })
}

fn merge_at_depth<R: Resolver + ?Sized>(
    s1: &SchemaValue,
    s2: &SchemaValue,
    _context: MergeContext,
    resolver: &R,
    depth: usize,
) -> Result<SchemaValue> {
    let left = expand(s1, Side::First, resolver, depth)?;
    let right = expand(s2, Side::Second, resolver, depth)?;

    let mut result = SchemaValue::new();

    result.extensions = left.extensions.clone();
    result.extensions.extend_from(&right.extensions);
    result.one_of = concat(&left.one_of, &right.one_of);
    result.all_of = concat(&left.all_of, &right.all_of);

    result.schema_type = match (left.schema_type, right.schema_type) {
        (Some(l), Some(r)) if l != r => {
            return Err(MergeError::IncompatibleTypes { left: l, right: r });
        }
        (l, r) => l.or(r),
    };

    if left.format != right.format {
        return Err(MergeError::IncompatibleFormats {
            left: left.format.clone(),
            right: right.format.clone(),
        });
    }
    result.format = left.format.clone();

    // Union rather than intersection: the permissive reading of two enums.
    result.enum_values = concat(&left.enum_values, &right.enum_values);

    result.default = match (&left.default, &right.default) {
        (Some(l), Some(r)) => {
            return Err(MergeError::UndefinedDefaultMerge {
                left: l.clone(),
                right: r.clone(),
            });
        }
        (l, r) => l.as_ref().or(r.as_ref()).cloned(),
    };

    result.unique_items = merge_flag(SchemaFlag::UniqueItems, left.unique_items, right.unique_items)?;
    result.exclusive_minimum = merge_bound(
        BoundField::ExclusiveMinimum,
        left.exclusive_minimum,
        right.exclusive_minimum,
    )?;
    result.exclusive_maximum = merge_bound(
        BoundField::ExclusiveMaximum,
        left.exclusive_maximum,
        right.exclusive_maximum,
    )?;
    result.nullable = merge_flag(SchemaFlag::Nullable, left.nullable, right.nullable)?;
    result.read_only = merge_flag(SchemaFlag::ReadOnly, left.read_only, right.read_only)?;
    result.write_only = merge_flag(SchemaFlag::WriteOnly, left.write_only, right.write_only)?;

    result.required = concat(&left.required, &right.required);

    // No conflict detection for a property defined on both sides: the second
    // definition replaces the first in place.
    result.properties = left.properties.clone();
    result.properties.extend_from(&right.properties);

    result.additional_properties =
        merge_additional_properties(&left.additional_properties, &right.additional_properties)?;

    Ok(result)
}

fn concat<T: Clone>(first: &[T], second: &[T]) -> Vec<T> {
    let mut merged = Vec::with_capacity(first.len() + second.len());
    merged.extend_from_slice(first);
    merged.extend_from_slice(second);
    merged
}

fn merge_flag(flag: SchemaFlag, left: bool, right: bool) -> Result<bool> {
    if left != right {
        return Err(MergeError::ConflictingFlag { flag, left, right });
    }
    Ok(left)
}

fn merge_bound(
    field: BoundField,
    left: Option<ExclusiveBound>,
    right: Option<ExclusiveBound>,
) -> Result<Option<ExclusiveBound>> {
    let (l, r) = match (left, right) {
        (Some(l), Some(r)) => (l, r),
        (l, r) => return Ok(l.or(r)),
    };
    match (l, r) {
        (ExclusiveBound::Flag(a), ExclusiveBound::Flag(b)) if a == b => Ok(Some(l)),
        (ExclusiveBound::Value(a), ExclusiveBound::Value(b)) if a == b => Ok(Some(l)),
        (ExclusiveBound::Flag(_), ExclusiveBound::Flag(_))
        | (ExclusiveBound::Value(_), ExclusiveBound::Value(_)) => Err(MergeError::ConflictingBound {
            field,
            left: l,
            right: r,
        }),
        (ExclusiveBound::Flag(_), ExclusiveBound::Value(_))
        | (ExclusiveBound::Value(_), ExclusiveBound::Flag(_)) => {
            Err(MergeError::IncompatibleBoundDialect {
                field,
                left: BoundDialect::from(l),
                right: BoundDialect::from(r),
            })
        }
    }
}

fn merge_additional_properties(
    left: &Option<AdditionalProperties>,
    right: &Option<AdditionalProperties>,
) -> Result<Option<AdditionalProperties>> {
    use AdditionalProperties::{Allowed, Schema};

    if matches!(left, Some(Allowed(false))) || matches!(right, Some(Allowed(false))) {
        return Ok(Some(Allowed(false)));
    }
    match (left, right) {
        (Some(Schema(_)), Some(Schema(_))) => Err(MergeError::UnsupportedAdditionalPropertiesMerge),
        (Some(Schema(schema)), _) | (_, Some(Schema(schema))) => Ok(Some(Schema(schema.clone()))),
        (Some(Allowed(true)), _) | (_, Some(Allowed(true))) => Ok(Some(Allowed(true))),
        _ => Ok(None),
    }
}
