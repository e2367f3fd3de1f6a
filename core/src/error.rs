//! Error taxonomy for schema composition.
//!
//! Every failure aborts the merge that produced it. Field-level variants name
//! the field and carry both conflicting values; the wrapping variants box the
//! underlying cause so it stays reachable through
//! [`source`](std::error::Error::source).

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::{ExclusiveBound, SchemaType};

/// Boolean schema flags that must agree between merged schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFlag {
    UniqueItems,
    Nullable,
    ReadOnly,
    WriteOnly,
}

impl fmt::Display for SchemaFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SchemaFlag::UniqueItems => "UniqueItems",
            SchemaFlag::Nullable => "Nullable",
            SchemaFlag::ReadOnly => "ReadOnly",
            SchemaFlag::WriteOnly => "WriteOnly",
        })
    }
}

/// Exclusive bound keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundField {
    ExclusiveMinimum,
    ExclusiveMaximum,
}

impl fmt::Display for BoundField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoundField::ExclusiveMinimum => "ExclusiveMinimum",
            BoundField::ExclusiveMaximum => "ExclusiveMaximum",
        })
    }
}

/// Which representation an [`ExclusiveBound`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundDialect {
    /// OpenAPI 3.0 boolean flag.
    Flag,
    /// OpenAPI 3.1 numeric bound.
    Numeric,
}

impl From<ExclusiveBound> for BoundDialect {
    fn from(bound: ExclusiveBound) -> Self {
        match bound {
            ExclusiveBound::Flag(_) => BoundDialect::Flag,
            ExclusiveBound::Value(_) => BoundDialect::Numeric,
        }
    }
}

impl fmt::Display for BoundDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoundDialect::Flag => "OpenAPI 3.0 boolean",
            BoundDialect::Numeric => "OpenAPI 3.1 numeric",
        })
    }
}

/// Position of a schema within a pairwise merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::First => "1",
            Side::Second => "2",
        })
    }
}

/// Errors raised while dereferencing, merging, or generating schemas.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    /// A reference has more than one `#` separator.
    #[error("unsupported reference: {0}")]
    UnsupportedReference(String),

    /// A reference resolved to nothing.
    #[error("no schema value found for reference: {0}")]
    MissingSchemaValue(String),

    #[error("can not merge incompatible types: {left} and {right}")]
    IncompatibleTypes { left: SchemaType, right: SchemaType },

    #[error("can not merge incompatible formats: {left:?} and {right:?}")]
    IncompatibleFormats {
        left: Option<String>,
        right: Option<String>,
    },

    #[error("merging two sets of defaults is undefined: {left} and {right}")]
    UndefinedDefaultMerge { left: Value, right: Value },

    #[error("merging two schemas with different {flag}: {left} and {right}")]
    ConflictingFlag {
        flag: SchemaFlag,
        left: bool,
        right: bool,
    },

    /// One side uses the boolean dialect and the other the numeric one.
    #[error("merging two schemas with {field} defined as {left} on one side and {right} on the other")]
    IncompatibleBoundDialect {
        field: BoundField,
        left: BoundDialect,
        right: BoundDialect,
    },

    #[error("merging two schemas with different {field}: {left} and {right}")]
    ConflictingBound {
        field: BoundField,
        left: ExclusiveBound,
        right: ExclusiveBound,
    },

    #[error("merging two schemas with additional properties, this is unhandled")]
    UnsupportedAdditionalPropertiesMerge,

    /// Flattening the nested `allOf` of one input failed.
    #[error("error transitive merging AllOf on schema {side}: {source}")]
    TransitiveFlatten {
        side: Side,
        #[source]
        source: Box<MergeError>,
    },

    /// Folding entry `index` of an `allOf` list into the accumulator failed.
    #[error("error merging schemas for AllOf: {source}")]
    AllOf {
        index: usize,
        #[source]
        source: Box<MergeError>,
    },

    #[error("allOf composition nested deeper than {limit} levels")]
    CompositionTooDeep { limit: usize },

    #[error("allOf composition lists no schemas")]
    EmptyComposition,

    #[error("legacy allOf merge algorithm is not available")]
    LegacyMergeUnavailable,
}

/// Convenience alias for results with [`MergeError`].
pub type Result<T, E = MergeError> = std::result::Result<T, E>;
