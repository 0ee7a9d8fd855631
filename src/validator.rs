//! Record validation against the fields of a schema version
//!
//! Only fields that exist in the record's own stored version are checked.
//! A field from another version is skipped, even when required, because it
//! could not have been supplied for that version.
//!
//! Per field, checks run in this order and stop at the first failure:
//! required, type, enum, then array or object constraints.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::error::{ValidationError, ValidationErrorKind};
use crate::field::{value_type_name, FieldKind, FieldSpec, NestedSchema, PropertyMap};
use crate::record::Record;
use crate::schema::SchemaModel;

/// Validates records against a schema model
#[derive(Debug, Clone, Copy)]
pub struct FieldValidator<'a> {
    model: &'a SchemaModel,
    deep_objects: bool,
}

impl<'a> FieldValidator<'a> {
    pub fn new(model: &'a SchemaModel, config: &EngineConfig) -> Self {
        Self {
            model,
            deep_objects: config.validation.deep_objects,
        }
    }

    /// Fail-fast validation: returns the first violation across the record
    pub fn validate(&self, record: &Record) -> Result<(), ValidationError> {
        self.validate_at(record.as_map(), record.version())
    }

    /// Validate a mapping against the fields active in `version`
    pub fn validate_at(&self, data: &Map<String, Value>, version: u32) -> Result<(), ValidationError> {
        for field in self.fields_for(version) {
            if let Err(kind) = self.check_field(field, data.get(&field.name)) {
                return Err(ValidationError::new(kind, Arc::new(data.clone())));
            }
        }
        Ok(())
    }

    /// Accumulating validation: the first violation of every field.
    /// An empty list means the record is valid.
    pub fn collect(&self, record: &Record) -> Vec<ValidationError> {
        let data = record.as_map();
        let mut kinds = Vec::new();
        for field in self.fields_for(record.version()) {
            if let Err(kind) = self.check_field(field, data.get(&field.name)) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            return Vec::new();
        }
        let snapshot = Arc::new(data.clone());
        kinds
            .into_iter()
            .map(|kind| ValidationError::new(kind, Arc::clone(&snapshot)))
            .collect()
    }

    fn fields_for(&self, version: u32) -> impl Iterator<Item = &'a FieldSpec> {
        self.model.fields().iter().filter(move |field| {
            let active = field.is_active_in(version);
            if !active {
                tracing::trace!(field = %field.name, version, "skipping field outside record version");
            }
            active
        })
    }

    fn check_field(&self, field: &FieldSpec, value: Option<&Value>) -> Result<(), ValidationErrorKind> {
        let name = &field.name;

        if field.required && is_blank(value) {
            return Err(ValidationErrorKind::Required { field: name.clone() });
        }
        let value = match value {
            Some(v) if !v.is_null() => v,
            _ => return Ok(()),
        };

        if !field.kind.matches(value) {
            return Err(ValidationErrorKind::TypeMismatch {
                field: name.clone(),
                expected: field.kind.as_str(),
                actual: value_type_name(value),
                value: value.clone(),
            });
        }

        if let Some(allowed) = &field.enum_values {
            if !is_allowed(allowed, value) {
                return Err(ValidationErrorKind::Enum {
                    field: name.clone(),
                    value: value.clone(),
                    allowed: allowed.clone(),
                });
            }
        }

        match (field.kind, value) {
            (FieldKind::Array, Value::Array(items)) => self.check_array(field, items, value),
            (FieldKind::Object, Value::Object(object)) => match &field.properties {
                Some(properties) => self.check_object(name, properties, object, value),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    fn check_array(&self, field: &FieldSpec, items: &[Value], value: &Value) -> Result<(), ValidationErrorKind> {
        let Some(constraints) = &field.array else {
            return Ok(());
        };
        let fail = |message: String, value: &Value| ValidationErrorKind::ArrayConstraint {
            field: field.name.clone(),
            message,
            value: value.clone(),
        };

        if let Some(min) = constraints.min_items {
            if items.len() < min {
                return Err(fail(format!("must have at least {} items, got {}", min, items.len()), value));
            }
        }
        if let Some(max) = constraints.max_items {
            if items.len() > max {
                return Err(fail(format!("must have at most {} items, got {}", max, items.len()), value));
            }
        }
        if constraints.unique_items && has_duplicates(items) {
            return Err(fail("items must be unique".to_string(), value));
        }

        if let Some(item_schema) = &constraints.items {
            for (index, item) in items.iter().enumerate() {
                if let Err(issue) = self.check_fragment(item_schema, item, "") {
                    let offending = if issue.reason == Reason::Missing { item } else { &issue.value };
                    return Err(fail(issue.item_message(index), offending));
                }
            }
        }
        Ok(())
    }

    fn check_object(
        &self,
        field: &str,
        properties: &PropertyMap,
        object: &Map<String, Value>,
        value: &Value,
    ) -> Result<(), ValidationErrorKind> {
        self.check_properties(properties, object, "").map_err(|issue| {
            let (property, message) = issue.property_message();
            ValidationErrorKind::ObjectValidation {
                field: field.to_string(),
                property,
                message,
                value: if issue.reason == Reason::Missing { value.clone() } else { issue.value },
            }
        })
    }

    /// Check one value against a fragment: type, enum, then its shape
    fn check_fragment(&self, schema: &NestedSchema, value: &Value, path: &str) -> Result<(), Issue> {
        if !schema.kind.matches(value) {
            return Err(Issue::new(path, value, Reason::Type {
                expected: schema.kind.as_str(),
                actual: value_type_name(value),
            }));
        }
        if let Some(allowed) = &schema.enum_values {
            if !is_allowed(allowed, value) {
                return Err(Issue::new(path, value, Reason::Enum { allowed: allowed.clone() }));
            }
        }
        match value {
            Value::Object(object) if !schema.properties.is_empty() => {
                self.check_properties(&schema.properties, object, path)
            }
            Value::Array(items) => match &schema.items {
                Some(item_schema) if self.deep_objects => {
                    for (index, item) in items.iter().enumerate() {
                        self.check_fragment(item_schema, item, &format!("{}[{}]", path, index))?;
                    }
                    Ok(())
                }
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Walk declared properties; nested shapes are descended only when
    /// `deep_objects` is on
    fn check_properties(&self, properties: &PropertyMap, object: &Map<String, Value>, prefix: &str) -> Result<(), Issue> {
        for (name, schema) in properties.iter() {
            let path = if prefix.is_empty() { name.to_string() } else { format!("{}.{}", prefix, name) };
            match object.get(name).filter(|v| !v.is_null()) {
                None if schema.required => {
                    return Err(Issue::new(&path, &Value::Null, Reason::Missing));
                }
                None => {}
                Some(value) if self.deep_objects => self.check_fragment(schema, value, &path)?,
                Some(value) => {
                    let shallow = NestedSchema {
                        properties: PropertyMap::new(),
                        items: None,
                        ..schema.clone()
                    };
                    self.check_fragment(&shallow, value, &path)?;
                }
            }
        }
        Ok(())
    }
}

/// Required check: missing, null, empty string or empty collection
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

fn has_duplicates(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(i, item)| is_allowed(&items[..i], item))
}

fn is_allowed(allowed: &[Value], value: &Value) -> bool {
    allowed.iter().any(|candidate| values_equal(candidate, value))
}

/// JSON equality where numbers compare by value (`2.0 == 2`)
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                x.as_f64() == y.as_f64()
            } else {
                x == y
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Reason {
    Missing,
    Type { expected: &'static str, actual: &'static str },
    Enum { allowed: Vec<Value> },
}

/// A violation inside a nested fragment, located by a relative path
#[derive(Debug)]
struct Issue {
    path: String,
    value: Value,
    reason: Reason,
}

impl Issue {
    fn new(path: &str, value: &Value, reason: Reason) -> Self {
        Self {
            path: path.to_string(),
            value: value.clone(),
            reason,
        }
    }

    /// Message for a violation inside an array element
    fn item_message(&self, index: usize) -> String {
        let at = format!("item at index {}", index);
        match (&self.reason, self.path.is_empty()) {
            (Reason::Missing, _) => format!("{} is missing required property '{}'", at, self.path),
            (Reason::Type { expected, actual }, true) => {
                format!("{} expected {}, got {}: {}", at, expected, actual, self.value)
            }
            (Reason::Type { expected, actual }, false) => {
                format!("{} property '{}' expected {}, got {}", at, self.path, expected, actual)
            }
            (Reason::Enum { allowed }, true) => {
                format!("{} value {} is not in allowed values {}", at, self.value, Value::Array(allowed.clone()))
            }
            (Reason::Enum { allowed }, false) => format!(
                "{} property '{}' value {} is not in allowed values {}",
                at,
                self.path,
                self.value,
                Value::Array(allowed.clone())
            ),
        }
    }

    /// Property path and message for a violation inside an object field
    fn property_message(&self) -> (String, String) {
        let message = match &self.reason {
            Reason::Missing => "required property is missing".to_string(),
            Reason::Type { expected, actual } => format!("expected {}, got {}", expected, actual),
            Reason::Enum { allowed } => format!(
                "value {} is not in allowed values {}",
                self.value,
                Value::Array(allowed.clone())
            ),
        };
        (self.path.clone(), message)
    }
}
