//! Projection of a schema model onto the wire schema handed to generators

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::checksum::Checksum;
use crate::config::EngineConfig;
use crate::error::{Result, SchemaError};
use crate::field::{FieldSpec, NestedSchema};
use crate::schema::SchemaModel;

/// Name of the synthetic reasoning property
pub const CHAIN_OF_THOUGHT: &str = "chain_of_thought";

/// Function-call style schema describing the fields active in one version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSchema {
    pub name: String,
    pub description: String,
    pub parameters: Parameters,
}

/// The object schema under `parameters`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(rename = "type")]
    pub kind: String,
    pub required: Vec<String>,
    pub properties: Map<String, Value>,
}

impl WireSchema {
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": self.parameters.kind,
                "required": self.parameters.required,
                "properties": self.parameters.properties,
            }
        })
    }

    /// SHA-256 over the compact JSON form
    pub fn fingerprint(&self) -> Checksum {
        Checksum::from_json(&self.to_value())
    }

    /// Compile `parameters` as a JSON Schema document
    pub fn check_well_formed(&self) -> Result<()> {
        let mut value = self.to_value();
        let parameters = value["parameters"].take();
        jsonschema::JSONSchema::compile(&parameters)
            .map(|_| ())
            .map_err(|e| SchemaError::InvalidFormat(e.to_string()))
    }
}

/// Emits wire schemas for a model's current version
#[derive(Debug, Clone, Default)]
pub struct SchemaSerializer {
    config: EngineConfig,
}

impl SchemaSerializer {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Serialize the fields active at `model.current_version()`
    pub fn serialize(&self, model: &SchemaModel) -> WireSchema {
        self.serialize_version(model, model.current_version())
    }

    /// Serialize the fields active at an arbitrary version
    pub fn serialize_version(&self, model: &SchemaModel, version: u32) -> WireSchema {
        let mut properties = Map::new();
        let mut required = Vec::new();

        if model.thinking() {
            properties.insert(
                CHAIN_OF_THOUGHT.to_string(),
                json!({
                    "type": "string",
                    "description": self.config.serializer.thinking_description,
                }),
            );
        }

        let active: Vec<&FieldSpec> = model.active_fields(version).collect();
        tracing::debug!(
            schema = model.name(),
            version,
            active = active.len(),
            declared = model.fields().len(),
            "serializing schema"
        );

        for field in active {
            properties.insert(field.name.clone(), field_to_wire(field));
            if field.required {
                required.push(field.name.clone());
            }
        }

        WireSchema {
            name: model.name().to_string(),
            description: model.description().unwrap_or_default().to_string(),
            parameters: Parameters {
                kind: "object".to_string(),
                required,
                properties,
            },
        }
    }
}

fn field_to_wire(field: &FieldSpec) -> Value {
    let mut out = Map::new();
    out.insert("type".into(), json!(field.kind.wire_type()));
    if let Some(description) = &field.description {
        out.insert("description".into(), json!(description));
    }
    if let Some(values) = &field.enum_values {
        out.insert("enum".into(), Value::Array(values.clone()));
    }

    if let Some(array) = &field.array {
        if let Some(items) = &array.items {
            out.insert("items".into(), fragment_to_wire(items));
        }
        if let Some(min) = array.min_items {
            out.insert("minItems".into(), json!(min));
        }
        if let Some(max) = array.max_items {
            out.insert("maxItems".into(), json!(max));
        }
        if array.unique_items {
            out.insert("uniqueItems".into(), json!(true));
        }
    }

    if let Some(properties) = &field.properties {
        insert_properties(&mut out, properties.iter());
    }

    Value::Object(out)
}

/// Shape a nested fragment; `required` flags are hoisted into the parent's list
fn fragment_to_wire(schema: &NestedSchema) -> Value {
    let mut out = Map::new();
    out.insert("type".into(), json!(schema.kind.wire_type()));
    if let Some(description) = &schema.description {
        out.insert("description".into(), json!(description));
    }
    if let Some(values) = &schema.enum_values {
        out.insert("enum".into(), Value::Array(values.clone()));
    }
    if let Some(items) = &schema.items {
        out.insert("items".into(), fragment_to_wire(items));
    }
    if !schema.properties.is_empty() {
        insert_properties(&mut out, schema.properties.iter());
    }
    Value::Object(out)
}

fn insert_properties<'a>(
    out: &mut Map<String, Value>,
    properties: impl Iterator<Item = (&'a str, &'a NestedSchema)>,
) {
    let mut shaped = Map::new();
    let mut required = Vec::new();
    for (name, schema) in properties {
        if schema.required {
            required.push(json!(name));
        }
        shaped.insert(name.to_string(), fragment_to_wire(schema));
    }
    out.insert("properties".into(), Value::Object(shaped));
    if !required.is_empty() {
        out.insert("required".into(), Value::Array(required));
    }
}
