//! Configuration file for schema composition runs.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! compatibility:
//!   old_merge_schemas: false
//! documents:
//!   - common.yaml
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use schema_compose_core::{CompatibilityOptions, MergeOptions};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level composition configuration.
///
/// # Examples
///
/// ```
/// use schema_compose_store::ComposeConfig;
///
/// let config: ComposeConfig = serde_yaml::from_str(r#"
/// version: "1.0"
/// compatibility:
///   old_merge_schemas: true
/// "#).unwrap();
/// assert!(config.merge_options().compatibility.old_merge_schemas);
/// assert!(config.documents.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Compatibility switches forwarded to the composer.
    #[serde(default)]
    pub compatibility: CompatibilityOptions,
    /// Documents to load in addition to those discovered through references,
    /// relative to the root document's directory.
    #[serde(default)]
    pub documents: Vec<String>,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            compatibility: CompatibilityOptions::default(),
            documents: Vec::new(),
        }
    }
}

impl ComposeConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::StoreError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::StoreError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns the composer options described by this configuration.
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            compatibility: self.compatibility.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
compatibility:
  old_merge_schemas: true
documents:
  - common.yaml
  - shared/errors.yaml
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: ComposeConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert!(config.compatibility.old_merge_schemas);
        assert_eq!(config.documents, vec!["common.yaml", "shared/errors.yaml"]);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: ComposeConfig = serde_yaml::from_str("version: \"1.0\"\n").unwrap();
        assert!(!config.compatibility.old_merge_schemas);
        assert!(config.documents.is_empty());
        assert_eq!(config.merge_options(), MergeOptions::default());
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compose.yml");

        let original: ComposeConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = ComposeConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ComposeConfig::load(dir.path().join("absent.yml"));
        assert!(matches!(result, Err(crate::StoreError::IoError(_))));
    }
}
