//! Engine configuration
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-versions.toml)
//! - Environment variables (SCHEMA_VERSIONS__*)
//!
//! ## Example config file (schema-versions.toml):
//! ```toml
//! [storage]
//! attribute = "extracted_data"
//!
//! [validation]
//! validate_on_save = true
//! deep_objects = true
//!
//! [serializer]
//! thinking_description = "Explain your thought process step by step before determining the final values."
//! ```
//!
//! The configuration is an explicit value handed to the serializer,
//! validator and records; nothing reads it from global state.

use std::path::PathBuf;

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Files searched relative to the working directory, lowest priority first
const LOCAL_CONFIG_FILES: [&str; 3] = [
    "schema-versions.toml",
    ".schema-versions.toml",
    "config/schema-versions.toml",
];

const ENV_PREFIX: &str = "SCHEMA_VERSIONS";

fn user_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "schema-versions", "schema-versions")
        .map(|dirs| dirs.config_dir().join("schema-versions.toml"))
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub serializer: SerializerConfig,
}

/// Where records live inside persisted rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Name of the row attribute holding the record mapping
    #[serde(default = "default_attribute")]
    pub attribute: String,
}

/// Validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Validate records before they are stamped for saving
    #[serde(default = "default_true")]
    pub validate_on_save: bool,

    /// Validate object properties that are themselves objects or arrays.
    /// When off, plain object fields are only checked one level deep.
    #[serde(default = "default_true")]
    pub deep_objects: bool,
}

/// Wire schema settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializerConfig {
    /// Description attached to the chain-of-thought property
    #[serde(default = "default_thinking_description")]
    pub thinking_description: String,
}

fn default_attribute() -> String {
    "extracted_data".to_string()
}

fn default_true() -> bool {
    true
}

fn default_thinking_description() -> String {
    "Explain your thought process step by step before determining the final values.".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            attribute: default_attribute(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_on_save: true,
            deep_objects: true,
        }
    }
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            thinking_description: default_thinking_description(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = LOCAL_CONFIG_FILES
            .iter()
            .fold(Config::builder(), |builder, location| {
                builder.add_source(File::with_name(location).required(false))
            });

        // Per-user file, e.g. ~/.config/schema-versions/schema-versions.toml
        if let Some(user_config) = user_config_file().filter(|path| path.exists()) {
            builder = builder.add_source(File::from(user_config).required(false));
        }

        // An explicit file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMA_VERSIONS__VALIDATION__DEEP_OBJECTS=false
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.storage.attribute, "extracted_data");
        assert!(config.validation.validate_on_save);
        assert!(config.validation.deep_objects);
        assert!(config.serializer.thinking_description.starts_with("Explain your thought process"));
    }

    #[test]
    fn test_serialize_config() {
        let toml_str = toml::to_string_pretty(&EngineConfig::default()).unwrap();
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[validation]"));
        assert!(toml_str.contains("[serializer]"));
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: EngineConfig = toml::from_str("[validation]\ndeep_objects = false\n").unwrap();
        assert!(!config.validation.deep_objects);
        assert!(config.validation.validate_on_save);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[storage]\nattribute = \"payload\"\n").unwrap();

        let config = EngineConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.storage.attribute, "payload");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(EngineConfig::load_from(Some(path.to_str().unwrap())).is_err());
    }
}
