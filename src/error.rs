//! Error types for schema construction, record validation and field access

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

/// Result type for schema construction and loading
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Build-time errors, raised while a schema is being declared or loaded
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid schema name '{0}': must match ^[a-zA-Z0-9_-]+$")]
    InvalidName(String),

    #[error("Schema name is required")]
    MissingName,

    #[error("Invalid version {0}: versions start at 1")]
    InvalidVersion(u32),

    #[error("Field '{0}' is already declared")]
    DuplicateField(String),

    #[error("Field name '{0}' is reserved")]
    ReservedField(String),

    #[error("Invalid option '{option}' for field '{field}': {reason}")]
    InvalidOption {
        field: String,
        option: String,
        reason: String,
    },

    #[error("Invalid version range '{0}'")]
    InvalidRange(String),

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    pub(crate) fn invalid_option(
        field: impl Into<String>,
        option: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            field: field.into(),
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// The specific rule a record violated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationErrorKind {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' expected {expected}, got {actual}: {value}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
        value: Value,
    },

    #[error("Field '{field}' value {value} is not in allowed values {}", format_values(.allowed))]
    Enum {
        field: String,
        value: Value,
        allowed: Vec<Value>,
    },

    #[error("Field '{field}' {message}")]
    ArrayConstraint {
        field: String,
        message: String,
        value: Value,
    },

    #[error("Field '{field}' property '{property}': {message}")]
    ObjectValidation {
        field: String,
        property: String,
        message: String,
        value: Value,
    },
}

fn format_values(values: &[Value]) -> String {
    let items: Vec<String> = values.iter().map(Value::to_string).collect();
    format!("[{}]", items.join(","))
}

/// A record failed validation against its schema.
///
/// Carries the violated rule and a shared snapshot of the record that was
/// being validated, so callers can decide whether to regenerate, log or
/// escalate with full context.
#[derive(Error, Debug, Clone)]
#[error("{kind}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    record: Arc<Map<String, Value>>,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, record: Arc<Map<String, Value>>) -> Self {
        Self { kind, record }
    }

    /// Name of the top-level field that failed
    pub fn field_name(&self) -> &str {
        match &self.kind {
            ValidationErrorKind::Required { field }
            | ValidationErrorKind::TypeMismatch { field, .. }
            | ValidationErrorKind::Enum { field, .. }
            | ValidationErrorKind::ArrayConstraint { field, .. }
            | ValidationErrorKind::ObjectValidation { field, .. } => field,
        }
    }

    /// The offending value, if the field had one
    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            ValidationErrorKind::Required { .. } => None,
            ValidationErrorKind::TypeMismatch { value, .. }
            | ValidationErrorKind::Enum { value, .. }
            | ValidationErrorKind::ArrayConstraint { value, .. }
            | ValidationErrorKind::ObjectValidation { value, .. } => Some(value),
        }
    }

    /// The record under validation
    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }
}

/// Errors raised when reading or writing a field on a stored record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Field '{field}' is not declared in this schema")]
    UnknownField { field: String },

    #[error(
        "Field '{field}' is not available in version {record_version}. \
         It was introduced in version {introduced_in}. \
         Upgrade the record by setting new values and saving."
    )]
    MissingField {
        field: String,
        record_version: u32,
        introduced_in: u32,
    },

    #[error("Field '{field}' has been removed in version {removed_in} and is no longer available")]
    RemovedField { field: String, removed_in: u32 },

    #[error("Field '{field}' is only available in versions: {allowed}")]
    VersionRange {
        field: String,
        record_version: u32,
        allowed: String,
    },
}

impl AccessError {
    /// Name of the field the access was attempted on
    pub fn field_name(&self) -> &str {
        match self {
            AccessError::UnknownField { field }
            | AccessError::MissingField { field, .. }
            | AccessError::RemovedField { field, .. }
            | AccessError::VersionRange { field, .. } => field,
        }
    }

    /// Whether upgrading the record can make the access succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccessError::MissingField { .. })
    }
}
