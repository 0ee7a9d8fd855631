//! Schema declaration documents
//!
//! A declaration is the data form of a schema: global settings plus an
//! ordered list of fields. Declarations are read from JSON or TOML and
//! turned into a [`SchemaModel`] through the builder, so every build-time
//! rule applies to them as well.
//!
//! ```json
//! {
//!   "name": "article",
//!   "version": 2,
//!   "thinking": true,
//!   "fields": [
//!     { "name": "title", "type": "string", "required": true },
//!     { "name": "tags", "type": "array", "items": { "type": "string" }, "maxItems": 3 },
//!     { "name": "legacy", "type": "string", "versions": "1..2" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::field::{FieldKind, FieldOptions, NestedSchema, PropertyMap};
use crate::range::VersionRange;
use crate::schema::SchemaModel;

/// Global settings and fields of one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDeclaration {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub thinking: bool,

    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

/// One field entry of a declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: FieldKind,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<NestedSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyMap>,

    #[serde(default, alias = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    #[serde(default, alias = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    #[serde(default, alias = "uniqueItems", skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<VersionRange>,
}

fn default_version() -> u32 {
    1
}

impl FieldDeclaration {
    fn options(&self) -> FieldOptions {
        FieldOptions {
            required: self.required,
            description: self.description.clone(),
            enum_values: self.enum_values.clone(),
            items: self.items.clone(),
            properties: self.properties.clone(),
            min_items: self.min_items,
            max_items: self.max_items,
            unique_items: self.unique_items,
            versions: self.versions.clone(),
        }
    }
}

impl SchemaDeclaration {
    /// Parse a JSON declaration
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a TOML declaration
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a declaration file; the format follows the extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            other => Err(SchemaError::InvalidFormat(format!(
                "unsupported declaration file extension {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    /// Run the declaration through the schema builder
    pub fn build(&self) -> Result<SchemaModel> {
        let mut builder = SchemaModel::builder();
        builder.set_name(&self.name)?.set_version(self.version)?;
        if let Some(description) = &self.description {
            builder.set_description(description);
        }
        builder.set_thinking(self.thinking);
        for field in &self.fields {
            builder.add_field(&field.name, field.kind, field.options())?;
        }
        builder.build()
    }
}
