//! Records and schema-bound record access
//!
//! A [`Record`] is the mapping persisted by the owning application. It holds
//! field values plus the reserved `version` entry. [`VersionedRecord`] pairs
//! a record with the shared [`SchemaModel`] and routes every read and write
//! through the version gate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::error::{AccessError, ValidationError};
use crate::gate::VersionGate;
use crate::schema::SchemaModel;
use crate::validator::FieldValidator;

/// Reserved key recording the schema version a record was saved with
pub const VERSION_KEY: &str = "version";

/// Version assumed for records that never stored one
pub const DEFAULT_VERSION: u32 = 1;

/// The stored mapping of field name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    data: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the record stored under `config.storage.attribute` of a
    /// persisted row. Rows without that attribute are treated as the
    /// record mapping itself.
    pub fn from_row(row: &Value, config: &EngineConfig) -> Option<Self> {
        let data = match row.get(&config.storage.attribute) {
            Some(inner) => inner.as_object()?,
            None => row.as_object()?,
        };
        Some(Self { data: data.clone() })
    }

    /// Stored version; absent or malformed entries count as version 1
    pub fn version(&self) -> u32 {
        self.data
            .get(VERSION_KEY)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v >= 1)
            .unwrap_or(DEFAULT_VERSION)
    }

    pub fn set_version(&mut self, version: u32) {
        self.data.insert(VERSION_KEY.to_string(), Value::from(version));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(name.into(), value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.data
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl TryFrom<Value> for Record {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(other),
        }
    }
}

/// A record bound to its owner's schema.
///
/// Field access goes through a generic `get`/`set` pair backed by the
/// schema's name lookup table.
#[derive(Debug, Clone)]
pub struct VersionedRecord {
    schema: Arc<SchemaModel>,
    config: EngineConfig,
    record: Record,
}

impl VersionedRecord {
    /// A fresh record, stamped with the schema's current version
    pub fn new(schema: Arc<SchemaModel>, config: EngineConfig) -> Self {
        let mut record = Record::new();
        record.set_version(schema.current_version());
        Self { schema, config, record }
    }

    /// Wrap a previously stored record without touching its version
    pub fn load(schema: Arc<SchemaModel>, config: EngineConfig, record: Record) -> Self {
        Self { schema, config, record }
    }

    pub fn schema(&self) -> &SchemaModel {
        &self.schema
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn version(&self) -> u32 {
        self.record.version()
    }

    /// Read a field, subject to the version the record was stored with.
    /// Returns `Ok(None)` for a permitted field that holds no value.
    pub fn get(&self, name: &str) -> Result<Option<&Value>, AccessError> {
        let field = self.schema.field(name).ok_or_else(|| AccessError::UnknownField {
            field: name.to_string(),
        })?;
        VersionGate::authorize(field, self.record.version(), self.schema.current_version())?;
        Ok(self.record.get(name).filter(|v| !v.is_null()))
    }

    /// Write a field. Only fields active in the schema's current version
    /// can be written, since saving stamps the record with that version.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        let field = self.schema.field(name).ok_or_else(|| AccessError::UnknownField {
            field: name.to_string(),
        })?;
        let current = self.schema.current_version();
        VersionGate::authorize(field, current, current)?;
        self.record.insert(name, value);
        Ok(())
    }

    /// Whether the record was saved at `required_version` or later
    pub fn is_compatible(&self, required_version: u32) -> bool {
        VersionGate::is_compatible(self.record.version(), required_version)
    }

    /// Validate against the fields of the record's stored version
    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldValidator::new(&self.schema, &self.config).validate(&self.record)
    }

    /// Validate the record as it will be written, then stamp it with the
    /// current version. On failure the stored version is left unchanged.
    pub fn prepare_save(&mut self) -> Result<&Record, ValidationError> {
        let current = self.schema.current_version();
        if self.config.validation.validate_on_save {
            FieldValidator::new(&self.schema, &self.config)
                .validate_at(self.record.as_map(), current)?;
        }
        self.record.set_version(current);
        Ok(&self.record)
    }
}
