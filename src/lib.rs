//! Versioned Field Schemas
//!
//! Declare typed fields once, tag each with the versions in which it exists,
//! and use the same declaration to:
//!
//! - **Export** a JSON-Schema-shaped contract of the current version for an
//!   external generator (optionally led by a chain-of-thought property)
//! - **Validate** generated records against the fields of the record's own
//!   version, with typed errors that drive retry logic
//! - **Gate** reads on stored records, distinguishing fields not yet
//!   introduced, removed, or outside the record's version
//!
//! ## Example
//!
//! ```
//! use schema_versions::{FieldKind, FieldOptions, SchemaModel, SchemaSerializer};
//!
//! let mut builder = SchemaModel::builder();
//! builder.set_name("article")?.set_version(2)?;
//! builder
//!     .add_field("title", FieldKind::String, FieldOptions::new().required())?
//!     .add_field("legacy", FieldKind::String, FieldOptions::new().versions(1..2))?;
//! let model = builder.build()?;
//!
//! let wire = SchemaSerializer::default().serialize(&model);
//! assert!(wire.parameters.properties.contains_key("title"));
//! assert!(!wire.parameters.properties.contains_key("legacy"));
//! # Ok::<(), schema_versions::SchemaError>(())
//! ```

pub mod checksum;
pub mod compatibility;
pub mod config;
pub mod declaration;
pub mod error;
pub mod field;
pub mod gate;
pub mod range;
pub mod record;
pub mod schema;
pub mod serializer;
pub mod validator;

pub use checksum::Checksum;
pub use compatibility::{ChangeType, FieldChange, VersionDiff};
pub use config::EngineConfig;
pub use declaration::{FieldDeclaration, SchemaDeclaration};
pub use error::{AccessError, Result, SchemaError, ValidationError, ValidationErrorKind};
pub use field::{FieldKind, FieldOptions, FieldSpec, NestedSchema, PropertyMap};
pub use gate::VersionGate;
pub use range::VersionRange;
pub use record::{Record, VersionedRecord};
pub use schema::{SchemaBuilder, SchemaModel};
pub use serializer::{SchemaSerializer, WireSchema, CHAIN_OF_THOUGHT};
pub use validator::FieldValidator;
