//! Field-level differences between two versions of a schema
//!
//! Detects which fields appear or disappear when a schema owner moves from
//! one version to another, and flags the changes that break existing
//! generators or readers.

use serde::{Deserialize, Serialize};

use crate::field::FieldSpec;
use crate::schema::SchemaModel;

/// Type of change between versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// The field exists in the target version but not in the base
    FieldAdded,
    /// The field exists in the base version but not in the target
    FieldRemoved,
}

/// A single field change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub change_type: ChangeType,
    pub field: String,
    pub is_breaking: bool,
    pub description: String,
}

impl FieldChange {
    fn added(field: &FieldSpec) -> Self {
        Self {
            change_type: ChangeType::FieldAdded,
            field: field.name.clone(),
            is_breaking: field.required,
            description: if field.required {
                format!("Required field '{}' was added (breaking)", field.name)
            } else {
                format!("Optional field '{}' was added", field.name)
            },
        }
    }

    fn removed(field: &FieldSpec) -> Self {
        Self {
            change_type: ChangeType::FieldRemoved,
            field: field.name.clone(),
            is_breaking: true,
            description: format!("Field '{}' was removed", field.name),
        }
    }
}

/// Result of comparing two versions of one schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub from: u32,
    pub to: u32,
    pub changes: Vec<FieldChange>,
}

impl VersionDiff {
    /// Compare the active field sets of `from` and `to`, in declaration order
    pub fn between(model: &SchemaModel, from: u32, to: u32) -> Self {
        let changes = model
            .fields()
            .iter()
            .filter_map(|field| match (field.is_active_in(from), field.is_active_in(to)) {
                (false, true) => Some(FieldChange::added(field)),
                (true, false) => Some(FieldChange::removed(field)),
                _ => None,
            })
            .collect();
        Self { from, to, changes }
    }

    pub fn is_breaking(&self) -> bool {
        self.changes.iter().any(|c| c.is_breaking)
    }

    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.by_type(ChangeType::FieldAdded)
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.by_type(ChangeType::FieldRemoved)
    }

    fn by_type(&self, change_type: ChangeType) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .filter(move |c| c.change_type == change_type)
            .map(|c| c.field.as_str())
    }

    pub fn summary(&self) -> String {
        let breaking = self.changes.iter().filter(|c| c.is_breaking).count();
        match (self.changes.len(), breaking) {
            (0, _) => format!("v{} -> v{}: no changes", self.from, self.to),
            (n, 0) => format!("v{} -> v{}: {} compatible changes", self.from, self.to, n),
            (n, b) => format!("v{} -> v{}: {} changes, {} breaking", self.from, self.to, n, b),
        }
    }
}
