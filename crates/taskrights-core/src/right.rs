//! Rights: the ordered capability levels attached to grants.
//!
//! A right is one of `Read < ReadWrite < Admin`. The absence of any right
//! is modeled as `Option::<Right>::None` rather than a sentinel value, so a
//! `Right` in hand is always valid. Raw integers coming from storage or the
//! wire go through [`Right::validate`] (or `TryFrom<i64>`), which rejects
//! everything outside `{0, 1, 2}` instead of clamping it.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A capability level.
///
/// The discriminants are the stored/transmitted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
#[repr(i64)]
pub enum Right {
    /// Read-only access.
    Read = 0,
    /// Read and write access.
    ReadWrite = 1,
    /// Full control, including sharing and destructive operations.
    Admin = 2,
}

impl Right {
    /// All rights, weakest first.
    pub const ALL: [Right; 3] = [Right::Read, Right::ReadWrite, Right::Admin];

    /// Validate a raw value and convert it.
    ///
    /// Negative sentinels and anything above `Admin` fail with
    /// [`CoreError::InvalidRight`].
    pub fn validate(raw: i64) -> Result<Self> {
        match raw {
            0 => Ok(Right::Read),
            1 => Ok(Right::ReadWrite),
            2 => Ok(Right::Admin),
            other => Err(CoreError::InvalidRight(other)),
        }
    }

    /// The raw stored value.
    pub const fn as_i64(self) -> i64 {
        self as i64
    }

    /// Compare two rights in the total order.
    pub fn compare(self, other: Right) -> Ordering {
        self.cmp(&other)
    }

    /// True iff `self >= wanted`.
    pub fn satisfies(self, wanted: Right) -> bool {
        self >= wanted
    }

    /// Like [`Right::satisfies`], but for a possibly absent right.
    ///
    /// No right satisfies nothing.
    pub fn held_satisfies(held: Option<Right>, wanted: Right) -> bool {
        held.is_some_and(|r| r.satisfies(wanted))
    }

    /// Fold another optional right into `best`, keeping the maximum.
    pub fn strongest(best: Option<Right>, other: Option<Right>) -> Option<Right> {
        match (best, other) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

impl TryFrom<i64> for Right {
    type Error = CoreError;

    fn try_from(raw: i64) -> Result<Self> {
        Right::validate(raw)
    }
}

impl From<Right> for i64 {
    fn from(right: Right) -> Self {
        right.as_i64()
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Right::Read => write!(f, "read"),
            Right::ReadWrite => write!(f, "read-write"),
            Right::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate_known_values() {
        assert_eq!(Right::validate(0).unwrap(), Right::Read);
        assert_eq!(Right::validate(1).unwrap(), Right::ReadWrite);
        assert_eq!(Right::validate(2).unwrap(), Right::Admin);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert_eq!(Right::validate(99), Err(CoreError::InvalidRight(99)));
        assert_eq!(Right::validate(-1), Err(CoreError::InvalidRight(-1)));
        assert_eq!(Right::validate(3), Err(CoreError::InvalidRight(3)));
    }

    #[test]
    fn test_satisfies() {
        assert!(Right::Admin.satisfies(Right::Read));
        assert!(Right::ReadWrite.satisfies(Right::ReadWrite));
        assert!(!Right::Read.satisfies(Right::ReadWrite));
        assert!(!Right::held_satisfies(None, Right::Read));
        assert!(Right::held_satisfies(Some(Right::Read), Right::Read));
    }

    #[test]
    fn test_strongest_keeps_maximum() {
        assert_eq!(Right::strongest(None, None), None);
        assert_eq!(Right::strongest(None, Some(Right::Read)), Some(Right::Read));
        assert_eq!(
            Right::strongest(Some(Right::Admin), Some(Right::Read)),
            Some(Right::Admin)
        );
    }

    #[test]
    fn test_serde_rejects_invalid_right() {
        let right: Right = serde_json::from_str("1").unwrap();
        assert_eq!(right, Right::ReadWrite);
        assert_eq!(serde_json::to_string(&Right::Admin).unwrap(), "2");

        assert!(serde_json::from_str::<Right>("99").is_err());
        assert!(serde_json::from_str::<Right>("-1").is_err());
    }

    proptest! {
        #[test]
        fn test_validate_roundtrips_or_rejects(raw in any::<i64>()) {
            match Right::validate(raw) {
                Ok(right) => prop_assert_eq!(right.as_i64(), raw),
                Err(e) => {
                    prop_assert!(!(0..=2).contains(&raw));
                    prop_assert_eq!(e, CoreError::InvalidRight(raw));
                }
            }
        }

        #[test]
        fn test_compare_agrees_with_raw_order(a in 0i64..=2, b in 0i64..=2) {
            let (ra, rb) = (Right::validate(a).unwrap(), Right::validate(b).unwrap());
            prop_assert_eq!(ra.compare(rb), a.cmp(&b));
            prop_assert_eq!(ra.satisfies(rb), a >= b);
        }
    }
}
