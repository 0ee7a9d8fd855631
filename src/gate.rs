//! Read access control for fields of stored records
//!
//! A record keeps the version it was last saved with. Reading a field is
//! allowed whenever that version lies inside the field's range, no matter
//! how far the schema has moved on since. Otherwise the denial names the
//! most specific reason:
//!
//! 1. removed: the field's last version is behind the schema's current
//!    version and the record is newer than that last version
//! 2. not yet introduced: the record predates the field, and the field is
//!    live by the current version
//! 3. out of range: anything else (gaps in a discrete set, fields from a
//!    future version, empty ranges)

use crate::error::AccessError;
use crate::field::FieldSpec;
use crate::range::VersionRange;

/// Access decisions for versioned fields
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionGate;

impl VersionGate {
    /// Decide whether `field` may be read on a record stored at `record_version`
    pub fn authorize(
        field: &FieldSpec,
        record_version: u32,
        current_version: u32,
    ) -> Result<(), AccessError> {
        let range = &field.versions;
        if range.contains(record_version) {
            return Ok(());
        }

        let denial = Self::deny(&field.name, range, record_version, current_version);
        tracing::debug!(
            field = %field.name,
            record_version,
            current_version,
            versions = %range,
            "field access denied"
        );
        Err(denial)
    }

    fn deny(name: &str, range: &VersionRange, record_version: u32, current_version: u32) -> AccessError {
        if range.is_empty() {
            return AccessError::VersionRange {
                field: name.to_string(),
                record_version,
                allowed: range.describe(),
            };
        }

        if let Some(last) = range.last_version() {
            if last < current_version && record_version > last {
                return AccessError::RemovedField {
                    field: name.to_string(),
                    removed_in: last + 1,
                };
            }
        }

        if let Some(introduced_in) = range.lower_bound() {
            if record_version < introduced_in && introduced_in <= current_version {
                return AccessError::MissingField {
                    field: name.to_string(),
                    record_version,
                    introduced_in,
                };
            }
        }

        AccessError::VersionRange {
            field: name.to_string(),
            record_version,
            allowed: range.describe(),
        }
    }

    /// Non-throwing check: was the record saved at `required_version` or later?
    pub fn is_compatible(record_version: u32, required_version: u32) -> bool {
        record_version >= required_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldKind, FieldOptions};

    fn field(versions: impl Into<VersionRange>) -> FieldSpec {
        FieldSpec::from_options("legacy", FieldKind::String, FieldOptions::new().versions(versions))
            .unwrap()
    }

    #[test]
    fn test_in_range_always_granted() {
        let f = field(1..3);
        assert!(VersionGate::authorize(&f, 2, 3).is_ok());
        assert!(VersionGate::authorize(&f, 1, 50).is_ok());
    }

    #[test]
    fn test_removed_exclusive_range() {
        let f = field(1..3);
        let err = VersionGate::authorize(&f, 3, 3).unwrap_err();
        assert_eq!(
            err,
            AccessError::RemovedField { field: "legacy".to_string(), removed_in: 3 }
        );
    }

    #[test]
    fn test_removed_inclusive_range() {
        let f = field(1..=2);
        let err = VersionGate::authorize(&f, 4, 4).unwrap_err();
        assert!(matches!(err, AccessError::RemovedField { removed_in: 3, .. }));
    }

    #[test]
    fn test_not_yet_introduced() {
        let f = field(3);
        let err = VersionGate::authorize(&f, 1, 3).unwrap_err();
        assert_eq!(
            err,
            AccessError::MissingField {
                field: "legacy".to_string(),
                record_version: 1,
                introduced_in: 3
            }
        );
        assert!(err.to_string().contains("introduced in version 3"));
    }

    #[test]
    fn test_future_field_is_out_of_range() {
        let f = field(5..);
        let err = VersionGate::authorize(&f, 2, 3).unwrap_err();
        assert!(matches!(err, AccessError::VersionRange { ref allowed, .. } if allowed == "5 and above"));
    }

    #[test]
    fn test_discrete_gap_is_out_of_range() {
        let f = field([1, 3, 5]);
        let err = VersionGate::authorize(&f, 2, 5).unwrap_err();
        assert_eq!(err.to_string(), "Field 'legacy' is only available in versions: 1, 3, 5");
    }

    #[test]
    fn test_upper_bound_not_behind_current_is_out_of_range() {
        let f = field(1..=5);
        let err = VersionGate::authorize(&f, 6, 3).unwrap_err();
        assert!(matches!(err, AccessError::VersionRange { .. }));
    }

    #[test]
    fn test_empty_range_is_out_of_range() {
        let f = field(VersionRange::inclusive(3, 1));
        for record_version in 1..=4 {
            let err = VersionGate::authorize(&f, record_version, 4).unwrap_err();
            assert!(matches!(err, AccessError::VersionRange { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_is_compatible() {
        assert!(VersionGate::is_compatible(3, 2));
        assert!(VersionGate::is_compatible(2, 2));
        assert!(!VersionGate::is_compatible(1, 2));
    }
}
