//! Go version normalization and comparison.
//!
//! Every toolchain version that enters switcher is parsed into a
//! [`GoVersion`], which always renders as `go<major>.<minor>.<patch>`.
//! Inputs may omit the `go` prefix and the patch component (`1.25` becomes
//! `go1.25.0`). Pre-release versions such as `go1.25rc1` are rejected.
//!
//! Companion tool versions (`v1.64.8`) follow an unrelated scheme and are
//! compared with [`compare_dotted`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::SwitcherError;

/// Prefix used by every rendered toolchain version.
pub const GO_PREFIX: &str = "go";

/// A normalized Go toolchain version.
///
/// Ordering is lexicographic on `(major, minor, patch)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GoVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl GoVersion {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for GoVersion {
    type Err = SwitcherError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let invalid = || SwitcherError::invalid_version(input);
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let digits = trimmed.strip_prefix(GO_PREFIX).unwrap_or(trimmed);
        let parts: Vec<&str> = digits.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(invalid());
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for GoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{GO_PREFIX}{}.{}.{}",
            self.major, self.minor, self.patch
        )
    }
}

impl Serialize for GoVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GoVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Normalizes a version like `1.24.2`, `go1.24` or ` go1.24.2 `.
///
/// # Errors
///
/// Returns [`SwitcherError::InvalidVersion`] when the input is empty, does
/// not have two or three components, or has a non-numeric component.
pub fn normalize(input: &str) -> Result<GoVersion> {
    Ok(input.parse::<GoVersion>()?)
}

/// Compares two toolchain versions after normalizing both.
///
/// # Errors
///
/// Returns an error if either side fails to normalize.
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    Ok(normalize(a)?.cmp(&normalize(b)?))
}

/// Compares dotted numeric versions such as `1.59.1` and `v1.60`.
///
/// An optional leading `v` is ignored and missing trailing components count
/// as zero, so `v1.60` equals `1.60.0`.
///
/// # Errors
///
/// Returns [`SwitcherError::InvalidDottedVersion`] if any component is not a
/// non-negative integer.
pub fn compare_dotted(a: &str, b: &str) -> Result<Ordering> {
    let a = parse_dotted(a)?;
    let b = parse_dotted(b)?;

    let len = a.len().max(b.len());
    for i in 0..len {
        let left = a.get(i).copied().unwrap_or(0);
        let right = b.get(i).copied().unwrap_or(0);
        match left.cmp(&right) {
            Ordering::Equal => {}
            other => return Ok(other),
        }
    }
    Ok(Ordering::Equal)
}

/// Returns `true` if `input` is a well-formed dotted version.
#[must_use]
pub fn is_dotted(input: &str) -> bool {
    parse_dotted(input).is_ok()
}

fn parse_dotted(input: &str) -> Result<Vec<u64>, SwitcherError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('v').unwrap_or(trimmed);
    digits
        .split('.')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(SwitcherError::InvalidDottedVersion {
                    input: input.to_string(),
                });
            }
            part.parse::<u64>()
                .map_err(|_| SwitcherError::InvalidDottedVersion {
                    input: input.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_common_forms() {
        assert_eq!(normalize("1.24.2").unwrap().to_string(), "go1.24.2");
        assert_eq!(normalize("go1.24.2").unwrap().to_string(), "go1.24.2");
        assert_eq!(normalize("1.25").unwrap().to_string(), "go1.25.0");
        assert_eq!(normalize("  go1.21 \n").unwrap().to_string(), "go1.21.0");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["1.24.2", "go1.24.2", "1.25"] {
            let once = normalize(input).unwrap().to_string();
            let twice = normalize(&once).unwrap().to_string();
            assert_eq!(once, twice, "normalization of {input} is not stable");
        }
    }

    #[test]
    fn normalize_rejects_non_numeric_components() {
        for input in ["go1.25rc1", "latest", "", "go", "1", "1.2.3.4", "1..2", "-1.2", "1.+2"] {
            let err = normalize(input).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<SwitcherError>(),
                    Some(SwitcherError::InvalidVersion { .. })
                ),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn compare_orders_by_components() {
        assert_eq!(compare("go1.24.0", "go1.23.9").unwrap(), Ordering::Greater);
        assert_eq!(compare("1.9.0", "1.10.0").unwrap(), Ordering::Less);
        assert_eq!(compare("go1.25", "1.25.0").unwrap(), Ordering::Equal);
    }

    #[test]
    fn compare_fails_on_invalid_side() {
        assert!(compare("go1.24.0", "tip").is_err());
        assert!(compare("tip", "go1.24.0").is_err());
    }

    #[test]
    fn compare_dotted_handles_prefix_and_missing_components() {
        assert_eq!(compare_dotted("1.59.1", "v1.60.0").unwrap(), Ordering::Less);
        assert_eq!(compare_dotted("v1.60", "1.60.0").unwrap(), Ordering::Equal);
        assert_eq!(compare_dotted("v2.9.0", "v1.64.8").unwrap(), Ordering::Greater);
        assert_eq!(compare_dotted("v1.2.3.4", "v1.2.3").unwrap(), Ordering::Greater);
    }

    #[test]
    fn compare_dotted_rejects_garbage() {
        assert!(compare_dotted("latest", "v1.0.0").is_err());
        assert!(!is_dotted("v1.x"));
        assert!(is_dotted("v1.64.8"));
    }

    #[test]
    fn go_version_serializes_as_string() {
        let version = GoVersion::new(1, 23, 4);
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"go1.23.4\"");
        let back: GoVersion = serde_json::from_str("\"1.23.4\"").unwrap();
        assert_eq!(back, version);
    }
}
