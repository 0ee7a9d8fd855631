//! Version ranges: the set of schema versions in which a field exists

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Range, RangeFrom, RangeInclusive};
use std::str::FromStr;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::SchemaError;

/// The versions in which a field is valid.
///
/// A bare integer always means "from this version onward", never "only this
/// version": `VersionRange::from(2)` contains 2, 3, 4, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionRange {
    /// Valid for every version `>= v`
    From(u32),
    /// Valid for `lo..=hi`, or `lo..hi` when `exclusive_hi` is set
    Closed { lo: u32, hi: u32, exclusive_hi: bool },
    /// Endless range `lo..`; same membership as `From`
    Unbounded(u32),
    /// Valid only for the listed versions
    Discrete(BTreeSet<u32>),
}

impl Default for VersionRange {
    fn default() -> Self {
        VersionRange::From(1)
    }
}

impl VersionRange {
    /// Inclusive range `lo..=hi`
    pub fn inclusive(lo: u32, hi: u32) -> Self {
        VersionRange::Closed { lo, hi, exclusive_hi: false }
    }

    /// Exclusive range `lo..hi`
    pub fn exclusive(lo: u32, hi: u32) -> Self {
        VersionRange::Closed { lo, hi, exclusive_hi: true }
    }

    /// Explicit set of versions
    pub fn discrete(versions: impl IntoIterator<Item = u32>) -> Self {
        VersionRange::Discrete(versions.into_iter().collect())
    }

    /// Check whether `version` falls inside this range
    pub fn contains(&self, version: u32) -> bool {
        match self {
            VersionRange::From(lo) | VersionRange::Unbounded(lo) => version >= *lo,
            VersionRange::Closed { lo, hi, exclusive_hi } => {
                version >= *lo && if *exclusive_hi { version < *hi } else { version <= *hi }
            }
            VersionRange::Discrete(set) => set.contains(&version),
        }
    }

    /// Whether no version can ever match
    pub fn is_empty(&self) -> bool {
        match self {
            VersionRange::From(_) | VersionRange::Unbounded(_) => false,
            VersionRange::Closed { lo, hi, exclusive_hi } => {
                hi < lo || (*exclusive_hi && hi == lo)
            }
            VersionRange::Discrete(set) => set.is_empty(),
        }
    }

    /// First version in which the field exists
    pub fn lower_bound(&self) -> Option<u32> {
        match self {
            VersionRange::From(lo) | VersionRange::Unbounded(lo) => Some(*lo),
            VersionRange::Closed { lo, .. } => Some(*lo),
            VersionRange::Discrete(set) => set.first().copied(),
        }
    }

    /// Last version in which the field exists, `None` when endless
    pub fn last_version(&self) -> Option<u32> {
        match self {
            VersionRange::From(_) | VersionRange::Unbounded(_) => None,
            VersionRange::Closed { hi, exclusive_hi: false, .. } => Some(*hi),
            VersionRange::Closed { hi, exclusive_hi: true, .. } => Some(hi.saturating_sub(1)),
            VersionRange::Discrete(set) => set.last().copied(),
        }
    }

    /// Human-readable description used in access errors
    pub fn describe(&self) -> String {
        match self {
            VersionRange::From(lo) | VersionRange::Unbounded(lo) => format!("{} and above", lo),
            VersionRange::Closed { lo, hi, exclusive_hi: false } => format!("{} to {}", lo, hi),
            VersionRange::Closed { lo, hi, exclusive_hi: true } => {
                format!("{} to {} (exclusive)", lo, hi)
            }
            VersionRange::Discrete(set) => set
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl fmt::Display for VersionRange {
    /// Writes the range back in the syntax accepted by `FromStr`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRange::From(lo) => write!(f, "{}", lo),
            VersionRange::Unbounded(lo) => write!(f, "{}..", lo),
            VersionRange::Closed { lo, hi, exclusive_hi: false } => write!(f, "{}..={}", lo, hi),
            VersionRange::Closed { lo, hi, exclusive_hi: true } => write!(f, "{}..{}", lo, hi),
            VersionRange::Discrete(set) => {
                let items: Vec<String> = set.iter().map(u32::to_string).collect();
                write!(f, "[{}]", items.join(","))
            }
        }
    }
}

impl From<u32> for VersionRange {
    fn from(v: u32) -> Self {
        VersionRange::From(v)
    }
}

impl From<RangeInclusive<u32>> for VersionRange {
    fn from(r: RangeInclusive<u32>) -> Self {
        VersionRange::inclusive(*r.start(), *r.end())
    }
}

impl From<Range<u32>> for VersionRange {
    fn from(r: Range<u32>) -> Self {
        VersionRange::exclusive(r.start, r.end)
    }
}

impl From<RangeFrom<u32>> for VersionRange {
    fn from(r: RangeFrom<u32>) -> Self {
        VersionRange::Unbounded(r.start)
    }
}

impl From<Vec<u32>> for VersionRange {
    fn from(v: Vec<u32>) -> Self {
        VersionRange::discrete(v)
    }
}

impl<const N: usize> From<[u32; N]> for VersionRange {
    fn from(v: [u32; N]) -> Self {
        VersionRange::discrete(v)
    }
}

impl FromStr for VersionRange {
    type Err = SchemaError;

    /// Parses `"2"`, `"2.."`, `"1..=3"`, `"1..3"` and `"[1,3,5]"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = || SchemaError::InvalidRange(s.to_string());
        let number = |part: &str| part.trim().parse::<u32>().map_err(|_| invalid());

        if let Some(list) = input.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let versions = list
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(number)
                .collect::<Result<BTreeSet<_>, _>>()?;
            return Ok(VersionRange::Discrete(versions));
        }

        match input.split_once("..") {
            None => Ok(VersionRange::From(number(input)?)),
            Some((lo, "")) => Ok(VersionRange::Unbounded(number(lo)?)),
            Some((lo, rest)) => match rest.strip_prefix('=') {
                Some(hi) => Ok(VersionRange::inclusive(number(lo)?, number(hi)?)),
                None => Ok(VersionRange::exclusive(number(lo)?, number(rest)?)),
            },
        }
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VersionRange::From(v) => serializer.serialize_u32(*v),
            VersionRange::Discrete(set) => serializer.collect_seq(set),
            other => serializer.collect_str(other),
        }
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    /// Accepts an integer, a range string or a list of integers
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RangeVisitor;

        impl<'de> Visitor<'de> for RangeVisitor {
            type Value = VersionRange;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a version number, a range such as \"1..=3\", or a list of versions")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<VersionRange, E> {
                u32::try_from(v)
                    .map(VersionRange::From)
                    .map_err(|_| E::custom(format!("version {} is out of range", v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<VersionRange, E> {
                u32::try_from(v)
                    .map(VersionRange::From)
                    .map_err(|_| E::custom(format!("version {} is out of range", v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<VersionRange, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<VersionRange, A::Error> {
                let mut versions = BTreeSet::new();
                while let Some(v) = seq.next_element::<u32>()? {
                    versions.insert(v);
                }
                Ok(VersionRange::Discrete(versions))
            }
        }

        deserializer.deserialize_any(RangeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_contains_lower_bound_onward() {
        let range = VersionRange::from(2);
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(3));
        assert!(range.contains(400));
        assert_eq!(range.describe(), "2 and above");
    }

    #[test]
    fn test_closed_ranges() {
        let inclusive = VersionRange::from(1..=3);
        assert!(inclusive.contains(1));
        assert!(inclusive.contains(3));
        assert!(!inclusive.contains(4));
        assert_eq!(inclusive.describe(), "1 to 3");
        assert_eq!(inclusive.last_version(), Some(3));

        let exclusive = VersionRange::from(1..3);
        assert!(exclusive.contains(2));
        assert!(!exclusive.contains(3));
        assert_eq!(exclusive.describe(), "1 to 3 (exclusive)");
        assert_eq!(exclusive.last_version(), Some(2));
    }

    #[test]
    fn test_unbounded_and_discrete() {
        let endless = VersionRange::from(3..);
        assert!(endless.contains(3));
        assert!(!endless.contains(2));
        assert_eq!(endless.last_version(), None);

        let set = VersionRange::from([5, 1, 3]);
        assert!(set.contains(1));
        assert!(!set.contains(2));
        assert!(set.contains(5));
        assert_eq!(set.describe(), "1, 3, 5");
        assert_eq!(set.lower_bound(), Some(1));
        assert_eq!(set.last_version(), Some(5));
    }

    #[test]
    fn test_inverted_range_never_matches() {
        let range = VersionRange::from(5..=2);
        assert!(range.is_empty());
        assert!((0..10).all(|v| !range.contains(v)));
        assert!(VersionRange::from(3..3).is_empty());
    }

    #[test]
    fn test_default_is_from_one() {
        assert_eq!(VersionRange::default(), VersionRange::From(1));
    }

    #[test]
    fn test_parse_range_syntax() {
        assert_eq!("2".parse::<VersionRange>().unwrap(), VersionRange::From(2));
        assert_eq!("2..".parse::<VersionRange>().unwrap(), VersionRange::Unbounded(2));
        assert_eq!("1..=3".parse::<VersionRange>().unwrap(), VersionRange::inclusive(1, 3));
        assert_eq!("1..3".parse::<VersionRange>().unwrap(), VersionRange::exclusive(1, 3));
        assert_eq!(
            "[1, 3]".parse::<VersionRange>().unwrap(),
            VersionRange::discrete([1, 3])
        );
        assert!("one..two".parse::<VersionRange>().is_err());
        assert!("".parse::<VersionRange>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for range in [
            VersionRange::From(4),
            VersionRange::Unbounded(2),
            VersionRange::inclusive(1, 3),
            VersionRange::exclusive(2, 6),
            VersionRange::discrete([2, 7]),
        ] {
            assert_eq!(range.to_string().parse::<VersionRange>().unwrap(), range);
        }
    }

    #[test]
    fn test_deserialize_forms() {
        let from: VersionRange = serde_json::from_str("2").unwrap();
        assert_eq!(from, VersionRange::From(2));

        let closed: VersionRange = serde_json::from_str("\"1..3\"").unwrap();
        assert_eq!(closed, VersionRange::exclusive(1, 3));

        let list: VersionRange = serde_json::from_str("[3, 1]").unwrap();
        assert_eq!(list, VersionRange::discrete([1, 3]));

        assert!(serde_json::from_str::<VersionRange>("-1").is_err());
    }
}
