//! Schema model and its builder

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SchemaError};
use crate::field::{FieldKind, FieldOptions, FieldSpec};
use crate::serializer::CHAIN_OF_THOUGHT;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid schema name pattern"))
}

/// Check a schema name against `^[a-zA-Z0-9_-]+$`
pub fn validate_name(name: &str) -> Result<()> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName(name.to_string()))
    }
}

/// An ordered, versioned set of fields.
///
/// Built once through [`SchemaBuilder`] and read-only afterwards; records of
/// the same owner share one model, typically behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    name: String,
    description: Option<String>,
    current_version: u32,
    thinking: bool,
    fields: Vec<FieldSpec>,
    index: HashMap<String, usize>,
}

impl SchemaModel {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Latest declared version; governs serialization and new records
    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    /// Whether a chain-of-thought property is requested from generators
    pub fn thinking(&self) -> bool {
        self.thinking
    }

    /// All declared fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Fields that exist in `version`, in declaration order
    pub fn active_fields(&self, version: u32) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.is_active_in(version))
    }
}

/// Incremental builder for [`SchemaModel`].
///
/// Every rule is enforced as soon as the offending call is made.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    name: Option<String>,
    description: Option<String>,
    current_version: Option<u32>,
    thinking: bool,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        validate_name(&name)?;
        self.name = Some(name);
        Ok(self)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Set the current version. Fields declared without a range still
    /// default to "from version 1", not to this version.
    pub fn set_version(&mut self, version: u32) -> Result<&mut Self> {
        if version < 1 {
            return Err(SchemaError::InvalidVersion(version));
        }
        self.current_version = Some(version);
        Ok(self)
    }

    pub fn set_thinking(&mut self, enabled: bool) -> &mut Self {
        self.thinking = enabled;
        self
    }

    /// Declare a field
    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        kind: FieldKind,
        options: FieldOptions,
    ) -> Result<&mut Self> {
        let spec = FieldSpec::from_options(name, kind, options)?;
        self.push(spec)?;
        Ok(self)
    }

    /// Declare an already-built field. The chain-of-thought property name
    /// is reserved whether or not thinking is enabled.
    pub fn push(&mut self, spec: FieldSpec) -> Result<&mut Self> {
        if spec.name == CHAIN_OF_THOUGHT {
            return Err(SchemaError::ReservedField(spec.name));
        }
        if self.fields.iter().any(|f| f.name == spec.name) {
            return Err(SchemaError::DuplicateField(spec.name));
        }
        if spec.versions.is_empty() {
            tracing::warn!(
                field = %spec.name,
                versions = %spec.versions,
                "version range is empty; field will never be active"
            );
        }
        tracing::debug!(field = %spec.name, kind = %spec.kind, versions = %spec.versions, "declared field");
        self.fields.push(spec);
        Ok(self)
    }

    /// Finish the build phase
    pub fn build(&mut self) -> Result<SchemaModel> {
        let name = self.name.clone().ok_or(SchemaError::MissingName)?;
        let fields = self.fields.clone();
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        Ok(SchemaModel {
            name,
            description: self.description.clone(),
            current_version: self.current_version.unwrap_or(1),
            thinking: self.thinking,
            fields,
            index,
        })
    }
}
