//! Schema object model consumed and produced by the merger.
//!
//! The types mirror the subset of an OpenAPI schema object that carries
//! merge semantics. They deserialize directly from OpenAPI documents (JSON or
//! YAML) and serialize back to a minimal schema object: unset fields are
//! omitted from the output.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::OrderedMap;
use crate::error::{MergeError, Result};

/// Primitive type tag of a schema.
///
/// # Examples
///
/// ```
/// use schema_compose_core::SchemaType;
///
/// let ty: SchemaType = serde_json::from_str("\"integer\"").unwrap();
/// assert_eq!(ty, SchemaType::Integer);
/// assert_eq!(ty.to_string(), "integer");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
}

impl SchemaType {
    /// Returns the keyword used in documents for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `$ref` pointer to a schema.
///
/// Local references start with `#` and address the document they appear in.
/// Anything else names another document, optionally followed by a
/// `#`-prefixed fragment.
///
/// # Examples
///
/// ```
/// use schema_compose_core::Reference;
///
/// let local = Reference::new("#/components/schemas/Pet");
/// assert!(local.is_local());
///
/// let external = Reference::new("common.yaml#/components/schemas/Error");
/// assert!(!external.is_local());
/// assert_eq!(
///     external.split().unwrap(),
///     ("common.yaml", Some("/components/schemas/Error"))
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    path: String,
}

impl Reference {
    /// Creates a reference from its raw `$ref` string.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the raw `$ref` string.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Returns `true` if this reference points into the current document.
    pub fn is_local(&self) -> bool {
        self.path.starts_with('#')
    }

    /// Splits the reference into its document path and optional fragment.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::UnsupportedReference`] if the reference contains
    /// more than one `#`.
    pub fn split(&self) -> Result<(&str, Option<&str>)> {
        let mut parts = self.path.split('#');
        let document = parts.next().unwrap_or_default();
        let fragment = parts.next();
        if parts.next().is_some() {
            return Err(MergeError::UnsupportedReference(self.path.clone()));
        }
        Ok((document, fragment))
    }

    /// Returns this reference prefixed with `document`.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_compose_core::Reference;
    ///
    /// let local = Reference::new("#/components/schemas/Tag");
    /// assert_eq!(
    ///     local.qualified("pets.yaml").as_str(),
    ///     "pets.yaml#/components/schemas/Tag"
    /// );
    /// ```
    pub fn qualified(&self, document: &str) -> Reference {
        Reference::new(format!("{document}{}", self.path))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Reference-or-inline handle to a schema.
///
/// Serialized as `{"$ref": "..."}` for references and as the schema object
/// itself for inline values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaSource {
    /// Pointer to a schema stored elsewhere.
    Reference(Reference),
    /// Schema written in place.
    Inline(Box<SchemaValue>),
}

impl SchemaSource {
    /// Creates a reference source.
    pub fn reference(path: impl Into<String>) -> Self {
        SchemaSource::Reference(Reference::new(path))
    }

    /// Returns the reference if this source is one.
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            SchemaSource::Reference(reference) => Some(reference),
            SchemaSource::Inline(_) => None,
        }
    }

    /// Returns `true` for a reference into the current document.
    pub fn is_local_reference(&self) -> bool {
        self.as_reference().is_some_and(Reference::is_local)
    }
}

impl From<SchemaValue> for SchemaSource {
    fn from(value: SchemaValue) -> Self {
        SchemaSource::Inline(Box::new(value))
    }
}

impl From<Reference> for SchemaSource {
    fn from(reference: Reference) -> Self {
        SchemaSource::Reference(reference)
    }
}

/// Value of `exclusiveMinimum` / `exclusiveMaximum`.
///
/// OpenAPI 3.0 uses a boolean flag that modifies `minimum`/`maximum`;
/// OpenAPI 3.1 carries the bound itself. The two never convert into each
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
    /// OpenAPI 3.0 style boolean flag.
    Flag(bool),
    /// OpenAPI 3.1 style numeric bound.
    Value(f64),
}

impl fmt::Display for ExclusiveBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusiveBound::Flag(flag) => write!(f, "{flag}"),
            ExclusiveBound::Value(value) => write!(f, "{value}"),
        }
    }
}

/// Value of `additionalProperties` when present.
///
/// Absence is modelled by wrapping this in `Option`; an explicit `false`
/// is distinct from a missing keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaSource>),
}

/// A dereferenced schema node.
///
/// Build values directly or with the chaining helpers:
///
/// ```
/// use schema_compose_core::{SchemaSource, SchemaType, SchemaValue};
///
/// let pet = SchemaValue::object()
///     .with_property("name", SchemaValue::of_type(SchemaType::String))
///     .with_property("tag", SchemaSource::reference("#/components/schemas/Tag"))
///     .with_required("name");
///
/// assert_eq!(pet.schema_type, Some(SchemaType::Object));
/// assert_eq!(pet.properties.len(), 2);
/// assert_eq!(pet.required, vec!["name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaValue {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<ExclusiveBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<ExclusiveBound>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique_items: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub write_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub properties: OrderedMap<String, SchemaSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaSource>,
    /// Vendor extensions (`x-*` keys). Other unknown keywords are dropped.
    #[serde(flatten, deserialize_with = "deserialize_extensions")]
    pub extensions: OrderedMap<String, Value>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

fn deserialize_extensions<'de, D>(deserializer: D) -> std::result::Result<OrderedMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut extensions = OrderedMap::<String, Value>::deserialize(deserializer)?;
    extensions.retain(|key, _| key.starts_with("x-"));
    Ok(extensions)
}

impl SchemaValue {
    /// Creates an unconstrained schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a schema constrained to `schema_type`.
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// Creates an `object` schema.
    pub fn object() -> Self {
        Self::of_type(SchemaType::Object)
    }

    /// Sets the format.
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Appends a property, replacing any existing property of that name.
    pub fn with_property(mut self, name: &str, schema: impl Into<SchemaSource>) -> Self {
        self.properties.insert(name.to_string(), schema.into());
        self
    }

    /// Appends a required property name.
    pub fn with_required(mut self, name: &str) -> Self {
        self.required.push(name.to_string());
        self
    }

    /// Appends enum values.
    pub fn with_enum(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values.extend(values);
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets `additionalProperties`.
    pub fn with_additional_properties(mut self, additional: AdditionalProperties) -> Self {
        self.additional_properties = Some(additional);
        self
    }

    /// Appends an `allOf` entry.
    pub fn with_all_of(mut self, entry: impl Into<SchemaSource>) -> Self {
        self.all_of.push(entry.into());
        self
    }

    /// Appends a `oneOf` entry.
    pub fn with_one_of(mut self, entry: impl Into<SchemaSource>) -> Self {
        self.one_of.push(entry.into());
        self
    }

    /// Sets a vendor extension.
    pub fn with_extension(mut self, key: &str, value: Value) -> Self {
        self.extensions.insert(key.to_string(), value);
        self
    }

    /// Returns `true` if `additionalProperties` is explicitly `false`.
    pub fn forbids_additional_properties(&self) -> bool {
        matches!(
            self.additional_properties,
            Some(AdditionalProperties::Allowed(false))
        )
    }
}
