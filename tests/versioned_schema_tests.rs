//! End-to-end tests: declaration → wire schema → validation → gated reads

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};

use schema_versions::{
    AccessError, EngineConfig, FieldKind, FieldOptions, FieldValidator, NestedSchema, Record,
    SchemaDeclaration, SchemaModel, SchemaSerializer, ValidationErrorKind, VersionRange,
    VersionedRecord, CHAIN_OF_THOUGHT,
};

fn article() -> SchemaModel {
    SchemaDeclaration::from_json(include_str!("fixtures/article.json"))
        .unwrap()
        .build()
        .unwrap()
}

fn record(value: Value) -> Record {
    Record::try_from(value).unwrap()
}

fn single_field(name: &str, kind: FieldKind, options: FieldOptions) -> SchemaModel {
    let mut builder = SchemaModel::builder();
    builder.set_name("scenario").unwrap();
    builder.add_field(name, kind, options).unwrap();
    builder.build().unwrap()
}

fn validate(model: &SchemaModel, value: Value) -> Result<(), schema_versions::ValidationError> {
    FieldValidator::new(model, &EngineConfig::default()).validate(&record(value))
}

// =============================================================================
// Wire Schema Tests
// =============================================================================

#[test]
fn test_serialize_contains_exactly_active_fields() {
    let model = article();
    let wire = SchemaSerializer::default().serialize(&model);

    let keys: Vec<&str> = wire.parameters.properties.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![CHAIN_OF_THOUGHT, "title", "body", "tags", "priority", "summary", "sentiment", "author"]
    );
    assert_eq!(wire.parameters.required, vec!["title", "summary"]);
}

#[test]
fn test_serialize_each_range_shape() {
    let mut builder = SchemaModel::builder();
    builder.set_name("shapes").unwrap().set_version(3).unwrap();
    builder
        .add_field("from_two", FieldKind::String, FieldOptions::new().versions(2))
        .unwrap()
        .add_field("from_four", FieldKind::String, FieldOptions::new().versions(4))
        .unwrap()
        .add_field("closed_in", FieldKind::String, FieldOptions::new().versions(1..=3))
        .unwrap()
        .add_field("closed_out", FieldKind::String, FieldOptions::new().versions(1..3))
        .unwrap()
        .add_field("endless", FieldKind::String, FieldOptions::new().versions(3..))
        .unwrap()
        .add_field("set_hit", FieldKind::String, FieldOptions::new().versions([1, 3]))
        .unwrap()
        .add_field("set_miss", FieldKind::String, FieldOptions::new().versions([1, 2, 4]))
        .unwrap();
    let model = builder.build().unwrap();

    let wire = SchemaSerializer::default().serialize(&model);
    let keys: HashSet<&str> = wire.parameters.properties.keys().map(String::as_str).collect();
    let expected: HashSet<&str> = model
        .fields()
        .iter()
        .filter(|f| f.versions.contains(3))
        .map(|f| f.name.as_str())
        .collect();

    assert_eq!(keys, expected);
    assert_eq!(keys, HashSet::from(["from_two", "closed_in", "endless", "set_hit"]));
}

#[test]
fn test_serialize_is_idempotent() {
    let model = article();
    let serializer = SchemaSerializer::default();
    assert_eq!(serializer.serialize(&model), serializer.serialize(&model));
    assert_eq!(
        serializer.serialize(&model).fingerprint(),
        serializer.serialize(&model).fingerprint()
    );
}

#[test]
fn test_required_fields_are_properties() {
    let wire = SchemaSerializer::default().serialize(&article());
    for name in &wire.parameters.required {
        assert!(wire.parameters.properties.contains_key(name), "{} missing", name);
    }
}

#[test]
fn test_older_version_export() {
    let model = article();
    let wire = SchemaSerializer::default().serialize_version(&model, 1);
    let keys: Vec<&str> = wire.parameters.properties.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![CHAIN_OF_THOUGHT, "title", "body", "tags", "priority", "legacy", "sentiment"]
    );
    assert!(wire.check_well_formed().is_ok());
}

#[test]
fn test_nested_required_hoisting() {
    let wire = SchemaSerializer::default().serialize(&article());
    let author = &wire.parameters.properties["author"];
    assert_eq!(author["required"], json!(["name"]));
    assert_eq!(author["properties"]["contact"]["required"], json!(["email"]));
    assert!(author["properties"]["name"].get("required").is_none());
}

#[test]
fn test_custom_thinking_description() {
    let mut config = EngineConfig::default();
    config.serializer.thinking_description = "Reason first.".to_string();
    let wire = SchemaSerializer::new(config).serialize(&article());
    assert_eq!(
        wire.parameters.properties[CHAIN_OF_THOUGHT],
        json!({"type": "string", "description": "Reason first."})
    );
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[test]
fn test_scenario_a_required_missing() {
    let model = single_field("title", FieldKind::String, FieldOptions::new().required());
    let err = validate(&model, json!({})).unwrap_err();
    assert!(matches!(err.kind, ValidationErrorKind::Required { .. }));
    assert_eq!(err.field_name(), "title");
}

#[test]
fn test_scenario_b_unique_items() {
    let options = FieldOptions::new()
        .items(NestedSchema::new(FieldKind::String))
        .min_items(1)
        .max_items(3)
        .unique_items();
    let model = single_field("tags", FieldKind::Array, options);

    let err = validate(&model, json!({"tags": ["a", "a"]})).unwrap_err();
    assert!(matches!(err.kind, ValidationErrorKind::ArrayConstraint { .. }));
    assert!(err.to_string().contains("unique"));
    assert!(validate(&model, json!({"tags": ["a", "b"]})).is_ok());
}

#[test]
fn test_scenario_c_removed_field() {
    let mut builder = SchemaModel::builder();
    builder.set_name("scenario").unwrap().set_version(3).unwrap();
    builder
        .add_field("legacy", FieldKind::String, FieldOptions::new().versions(1..3))
        .unwrap();
    let model = Arc::new(builder.build().unwrap());

    let old = VersionedRecord::load(
        Arc::clone(&model),
        EngineConfig::default(),
        record(json!({"version": 2, "legacy": "still here"})),
    );
    assert_eq!(old.get("legacy").unwrap(), Some(&json!("still here")));

    let new = VersionedRecord::load(
        model,
        EngineConfig::default(),
        record(json!({"version": 3, "legacy": "stale"})),
    );
    let err = new.get("legacy").unwrap_err();
    assert!(matches!(err, AccessError::RemovedField { removed_in: 3, .. }));
    assert!(!err.is_retryable());
}

#[test]
fn test_scenario_d_enum() {
    let options = FieldOptions::new().enum_values([json!(1), json!(2), json!(3)]);
    let model = single_field("priority", FieldKind::Integer, options);

    let err = validate(&model, json!({"priority": 4})).unwrap_err();
    match &err.kind {
        ValidationErrorKind::Enum { value, allowed, .. } => {
            assert_eq!(value, &json!(4));
            assert_eq!(allowed, &vec![json!(1), json!(2), json!(3)]);
        }
        other => panic!("Expected Enum, got {:?}", other),
    }
}

#[test]
fn test_scenario_e_thinking() {
    let mut builder = SchemaModel::builder();
    builder.set_name("scenario").unwrap().set_thinking(true);
    builder
        .add_field("answer", FieldKind::String, FieldOptions::new().required())
        .unwrap()
        .add_field("confidence", FieldKind::Number, FieldOptions::new())
        .unwrap();
    let wire = SchemaSerializer::default().serialize(&builder.build().unwrap());

    assert_eq!(wire.parameters.properties.len(), 3);
    assert_eq!(wire.parameters.properties.keys().next().unwrap(), CHAIN_OF_THOUGHT);
    assert_eq!(wire.parameters.required, vec!["answer"]);
}

// =============================================================================
// Record Lifecycle Tests
// =============================================================================

#[test]
fn test_version_skip_never_flags_required() {
    let mut builder = SchemaModel::builder();
    builder.set_name("scenario").unwrap().set_version(5).unwrap();
    builder
        .add_field("late", FieldKind::String, FieldOptions::new().required().versions(5))
        .unwrap();
    let model = builder.build().unwrap();
    assert!(validate(&model, json!({"version": 3})).is_ok());
}

#[test]
fn test_round_trip_validated_record_reads_back() {
    let model = Arc::new(article());
    let mut fresh = VersionedRecord::new(Arc::clone(&model), EngineConfig::default());
    let values = [
        ("title", json!("Rust 2.0 announced")),
        ("tags", json!(["rust", "release"])),
        ("priority", json!(2)),
        ("summary", json!("Short summary")),
        ("sentiment", json!("positive")),
        ("author", json!({"name": "Sam", "contact": {"email": "sam@example.com"}})),
    ];
    for (name, value) in &values {
        fresh.set(name, value.clone()).unwrap();
    }
    let stored = fresh.prepare_save().unwrap().clone();

    let reloaded = VersionedRecord::load(model, EngineConfig::default(), stored);
    assert!(reloaded.validate().is_ok());
    for (name, value) in &values {
        assert_eq!(reloaded.get(name).unwrap(), Some(value));
    }
    assert_eq!(reloaded.get("body").unwrap(), None);
}

#[test]
fn test_old_record_access_matrix() {
    let model = Arc::new(article());
    let v1 = VersionedRecord::load(
        Arc::clone(&model),
        EngineConfig::default(),
        record(json!({"title": "Old", "legacy": "x", "sentiment": "neutral"})),
    );

    assert_eq!(v1.version(), 1);
    assert!(v1.get("legacy").is_ok());
    assert!(v1.get("sentiment").is_ok());
    assert!(matches!(
        v1.get("summary"),
        Err(AccessError::MissingField { introduced_in: 2, record_version: 1, .. })
    ));
    assert!(matches!(v1.get("author"), Err(AccessError::MissingField { .. })));
    assert!(matches!(v1.get("experimental"), Err(AccessError::VersionRange { .. })));
    assert!(validate(&model, json!({"title": "Old"})).is_ok());

    let v2 = VersionedRecord::load(
        model,
        EngineConfig::default(),
        record(json!({"version": 2, "title": "Mid", "summary": "s"})),
    );
    let err = v2.get("sentiment").unwrap_err();
    assert_eq!(err.to_string(), "Field 'sentiment' is only available in versions: 1, 3");
}

#[test]
fn test_nested_object_errors_carry_record() {
    let model = article();
    let value = json!({
        "version": 3,
        "title": "t",
        "summary": "s",
        "author": {"name": "Sam", "contact": {}}
    });
    let err = validate(&model, value.clone()).unwrap_err();
    match &err.kind {
        ValidationErrorKind::ObjectValidation { field, property, .. } => {
            assert_eq!(field, "author");
            assert_eq!(property, "contact.email");
        }
        other => panic!("Expected ObjectValidation, got {:?}", other),
    }
    assert_eq!(Value::Object(err.record().clone()), value);
}

#[test]
fn test_bare_integer_means_from() {
    let model = single_field("f", FieldKind::String, FieldOptions::new().versions(2));
    assert_eq!(model.field("f").unwrap().versions, VersionRange::From(2));
    assert!((2..10).all(|v| model.field("f").unwrap().is_active_in(v)));
    assert!(!model.field("f").unwrap().is_active_in(1));
}
