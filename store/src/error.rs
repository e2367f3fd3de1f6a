//! Error types for document loading and composition.
//!
//! Covers I/O, JSON/YAML parsing, schema indexing, and merge failures
//! surfaced from [`schema_compose_core`].

use std::path::PathBuf;

use schema_compose_core::MergeError;
use thiserror::Error;

/// Errors that can occur while loading documents or composing schemas.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A document could not be read from disk.
    #[error("failed to read document '{}': {source}", path.display())]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The builder was finished without a root document.
    #[error("no root document configured")]
    MissingRoot,

    /// A schema in a document does not fit the schema object model.
    #[error("invalid schema at {reference}: {message}")]
    InvalidSchema { reference: String, message: String },

    /// The root document has no component schema of that name.
    #[error("unknown component schema: {0}")]
    UnknownComponent(String),

    /// Composition failed.
    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
