//! Field declarations and nested schema fragments

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::range::VersionRange;

/// Kind of value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    /// Long-form string; identical to `String` on the wire
    Text,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    /// Name used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
        }
    }

    /// JSON Schema `type` keyword
    pub fn wire_type(&self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            other => other.as_str(),
        }
    }

    /// Check whether a value's runtime shape matches this kind
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String | FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime type name of a JSON value, for error messages
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Schema fragment for array items and object properties.
///
/// Fragments nest arbitrarily: an object property may itself carry
/// properties, and an array item may be an object with properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedSchema {
    #[serde(rename = "type")]
    pub kind: FieldKind,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<NestedSchema>>,

    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub properties: PropertyMap,
}

impl NestedSchema {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            description: None,
            enum_values: None,
            items: None,
            properties: PropertyMap::default(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn enum_values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }

    pub fn items(mut self, items: NestedSchema) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn property(mut self, name: impl Into<String>, schema: NestedSchema) -> Self {
        self.properties.insert(name, schema);
        self
    }

    /// Reject `items` on non-arrays and `properties` on non-objects, recursively
    fn check(&self, path: &str) -> Result<()> {
        if self.items.is_some() && self.kind != FieldKind::Array {
            return Err(SchemaError::invalid_option(
                path,
                "items",
                format!("only valid for array kind, not {}", self.kind),
            ));
        }
        if !self.properties.is_empty() && self.kind != FieldKind::Object {
            return Err(SchemaError::invalid_option(
                path,
                "properties",
                format!("only valid for object kind, not {}", self.kind),
            ));
        }
        if let Some(items) = &self.items {
            items.check(&format!("{}[]", path))?;
        }
        for (name, property) in self.properties.iter() {
            property.check(&format!("{}.{}", path, name))?;
        }
        Ok(())
    }
}

/// Ordered mapping of property name to fragment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap(Vec<(String, NestedSchema)>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property, keeping first-insertion order
    pub fn insert(&mut self, name: impl Into<String>, schema: NestedSchema) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = schema,
            None => self.0.push((name, schema)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&NestedSchema> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NestedSchema)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, NestedSchema)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (N, NestedSchema)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (name, schema) in iter {
            map.insert(name, schema);
        }
        map
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, schema) in &self.0 {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PropertyMapVisitor;

        impl<'de> Visitor<'de> for PropertyMapVisitor {
            type Value = PropertyMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of property names to schemas")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<PropertyMap, A::Error> {
                let mut map = PropertyMap::new();
                while let Some((name, schema)) = access.next_entry::<String, NestedSchema>()? {
                    map.insert(name, schema);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(PropertyMapVisitor)
    }
}

/// Options accepted when declaring a field.
///
/// Array-only options (`items`, `min_items`, `max_items`, `unique_items`) and
/// the object-only `properties` are rejected at build time on other kinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    pub required: bool,
    pub description: Option<String>,
    pub enum_values: Option<Vec<Value>>,
    pub items: Option<NestedSchema>,
    pub properties: Option<PropertyMap>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: Option<bool>,
    pub versions: Option<VersionRange>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn enum_values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }

    pub fn items(mut self, items: NestedSchema) -> Self {
        self.items = Some(items);
        self
    }

    pub fn property(mut self, name: impl Into<String>, schema: NestedSchema) -> Self {
        self.properties.get_or_insert_with(PropertyMap::new).insert(name, schema);
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = Some(n);
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    pub fn unique_items(mut self) -> Self {
        self.unique_items = Some(true);
        self
    }

    pub fn versions(mut self, versions: impl Into<VersionRange>) -> Self {
        self.versions = Some(versions.into());
        self
    }
}

/// Cardinality and item constraints of an array field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayConstraints {
    pub items: Option<NestedSchema>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,
}

/// One declared field. Immutable once added to a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub description: Option<String>,
    pub enum_values: Option<Vec<Value>>,
    pub versions: VersionRange,
    /// Present only for `FieldKind::Array`
    pub array: Option<ArrayConstraints>,
    /// Present only for `FieldKind::Object`
    pub properties: Option<PropertyMap>,
}

impl FieldSpec {
    /// Build a field from options, rejecting options that do not fit the kind
    pub fn from_options(name: impl Into<String>, kind: FieldKind, options: FieldOptions) -> Result<Self> {
        let name = name.into();
        let FieldOptions {
            required,
            description,
            enum_values,
            items,
            properties,
            min_items,
            max_items,
            unique_items,
            versions,
        } = options;

        let array_only = [
            ("items", items.is_some()),
            ("min_items", min_items.is_some()),
            ("max_items", max_items.is_some()),
            ("unique_items", unique_items == Some(true)),
        ];
        if kind != FieldKind::Array {
            if let Some((option, _)) = array_only.iter().find(|(_, set)| *set) {
                return Err(SchemaError::invalid_option(
                    &name,
                    *option,
                    format!("only valid for array kind, not {}", kind),
                ));
            }
        }
        if kind != FieldKind::Object && properties.is_some() {
            return Err(SchemaError::invalid_option(
                &name,
                "properties",
                format!("only valid for object kind, not {}", kind),
            ));
        }
        if matches!(kind, FieldKind::Array | FieldKind::Object) && enum_values.is_some() {
            return Err(SchemaError::invalid_option(
                &name,
                "enum",
                format!("not supported for {} kind", kind),
            ));
        }
        if let (Some(min), Some(max)) = (min_items, max_items) {
            if min > max {
                return Err(SchemaError::invalid_option(
                    &name,
                    "min_items",
                    format!("min_items {} exceeds max_items {}", min, max),
                ));
            }
        }
        if let Some(items) = &items {
            items.check(&format!("{}[]", name))?;
        }
        if let Some(properties) = &properties {
            for (property, schema) in properties.iter() {
                schema.check(&format!("{}.{}", name, property))?;
            }
        }

        let array = (kind == FieldKind::Array).then(|| ArrayConstraints {
            items,
            min_items,
            max_items,
            unique_items: unique_items.unwrap_or(false),
        });

        Ok(Self {
            name,
            kind,
            required,
            description,
            enum_values,
            versions: versions.unwrap_or_default(),
            array,
            properties: if kind == FieldKind::Object { properties } else { None },
        })
    }

    /// Whether this field exists in `version`
    pub fn is_active_in(&self, version: u32) -> bool {
        self.versions.contains(version)
    }
}
