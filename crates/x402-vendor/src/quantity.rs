//! Resource-quantity value objects for deployment configs.
//!
//! CPU and memory requests/limits travel as Kubernetes-style quantity strings
//! (`"500m"`, `"1Gi"`). Both types validate their grammar at construction and
//! are immutable afterwards.
//!
//! Equality is by the canonical input string, not by magnitude: `"500m"` and
//! `"0.5"` both denote 500 milli-cores yet compare unequal. Callers that care
//! about magnitude compare [`CpuQuantity::milli_cores`] / [`MemoryQuantity::bytes`].

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// A quantity string that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidQuantity(String);

impl InvalidQuantity {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

static CPU_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]{1,3})?$").expect("valid regex"));
static CPU_MILLI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+m$").expect("valid regex"));

/// A CPU quantity such as `"500m"`, `"1"`, or `"0.125"`.
///
/// Decimal core form allows at most three fractional digits; anything with a
/// sub-milli remainder after scaling to milli-cores is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CpuQuantity {
    value: String,
    milli_cores: u64,
}

impl CpuQuantity {
    pub fn new(value: &str) -> Result<Self, InvalidQuantity> {
        let v = value.trim();
        if v.is_empty() {
            return Err(InvalidQuantity::new("CPU quantity cannot be empty"));
        }
        let milli_cores = Self::parse_milli_cores(v).ok_or_else(|| {
            InvalidQuantity::new("Invalid CPU quantity. Examples: 500m, 1, 0.5, 0.125")
        })?;
        if milli_cores == 0 {
            return Err(InvalidQuantity::new("CPU quantity must be > 0"));
        }
        Ok(Self {
            value: v.to_string(),
            milli_cores,
        })
    }

    fn parse_milli_cores(v: &str) -> Option<u64> {
        if v.ends_with('m') {
            if !CPU_MILLI.is_match(v) {
                return None;
            }
            return v[..v.len() - 1].parse::<u64>().ok();
        }
        if !CPU_DECIMAL.is_match(v) {
            return None;
        }
        let cores = Decimal::from_str(v).ok()?;
        let milli = cores.checked_mul(Decimal::ONE_THOUSAND)?;
        if milli.normalize().scale() > 0 {
            return None;
        }
        milli.to_u64()
    }

    /// The quantity in milli-cores.
    pub fn milli_cores(&self) -> u64 {
        self.milli_cores
    }

    /// The canonical input string.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns `self` when `other` is absent, blank, or equal to the current
    /// value; otherwise validates `other` and returns it.
    pub fn patch(&self, other: Option<&str>) -> Result<Self, InvalidQuantity> {
        match other {
            Some(s) if !s.trim().is_empty() && s != self.value => Self::new(s),
            _ => Ok(self.clone()),
        }
    }
}

impl TryFrom<String> for CpuQuantity {
    type Error = InvalidQuantity;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CpuQuantity> for String {
    fn from(value: CpuQuantity) -> Self {
        value.value
    }
}

impl fmt::Display for CpuQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A memory quantity such as `"128974848"`, `"129M"`, or `"1Gi"`.
///
/// The mantissa must be a plain integer; units are the case-sensitive SI and
/// binary suffixes up to `E`/`Ei`. Values above `i64::MAX` bytes are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemoryQuantity {
    value: String,
    bytes: u64,
}

impl MemoryQuantity {
    pub fn new(value: &str) -> Result<Self, InvalidQuantity> {
        let v = value.trim();
        if v.is_empty() {
            return Err(InvalidQuantity::new("Memory quantity cannot be empty"));
        }
        let bytes = Self::parse_bytes(v).ok_or_else(|| {
            InvalidQuantity::new("Invalid memory quantity. Examples: 128974848, 129M, 123Mi, 1G, 1Gi")
        })?;
        if bytes == 0 {
            return Err(InvalidQuantity::new("Memory quantity must be > 0"));
        }
        if bytes > i64::MAX as u128 {
            return Err(InvalidQuantity::new("Memory quantity is too large"));
        }
        Ok(Self {
            value: v.to_string(),
            bytes: bytes as u64,
        })
    }

    fn unit_factor(unit: &str) -> Option<u128> {
        let factor = match unit {
            "" => 1,
            "K" => 1000u128,
            "M" => 1000u128.pow(2),
            "G" => 1000u128.pow(3),
            "T" => 1000u128.pow(4),
            "P" => 1000u128.pow(5),
            "E" => 1000u128.pow(6),
            "Ki" => 1024u128,
            "Mi" => 1024u128.pow(2),
            "Gi" => 1024u128.pow(3),
            "Ti" => 1024u128.pow(4),
            "Pi" => 1024u128.pow(5),
            "Ei" => 1024u128.pow(6),
            _ => return None,
        };
        Some(factor)
    }

    fn parse_bytes(v: &str) -> Option<u128> {
        let split = v
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(v.len());
        let (num_part, unit_part) = v.split_at(split);
        if num_part.is_empty() {
            return None;
        }
        let num = num_part.parse::<u128>().ok()?;
        let factor = Self::unit_factor(unit_part)?;
        num.checked_mul(factor)
    }

    /// The quantity in bytes.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// The canonical input string.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns `self` when `other` is absent, blank, or equal to the current
    /// value; otherwise validates `other` and returns it.
    pub fn patch(&self, other: Option<&str>) -> Result<Self, InvalidQuantity> {
        match other {
            Some(s) if !s.trim().is_empty() && s != self.value => Self::new(s),
            _ => Ok(self.clone()),
        }
    }
}

impl TryFrom<String> for MemoryQuantity {
    type Error = InvalidQuantity;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<MemoryQuantity> for String {
    fn from(value: MemoryQuantity) -> Self {
        value.value
    }
}

impl fmt::Display for MemoryQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_milli_form() {
        let q = CpuQuantity::new("500m").unwrap();
        assert_eq!(q.milli_cores(), 500);
        assert_eq!(q.as_str(), "500m");
    }

    #[test]
    fn test_cpu_decimal_form() {
        assert_eq!(CpuQuantity::new("1").unwrap().milli_cores(), 1000);
        assert_eq!(CpuQuantity::new("0.5").unwrap().milli_cores(), 500);
        assert_eq!(CpuQuantity::new("0.125").unwrap().milli_cores(), 125);
        assert_eq!(CpuQuantity::new("0.001").unwrap().milli_cores(), 1);
    }

    #[test]
    fn test_cpu_rejects_invalid() {
        assert!(CpuQuantity::new("0.0001").is_err());
        assert!(CpuQuantity::new("0").is_err());
        assert!(CpuQuantity::new("-1").is_err());
        assert!(CpuQuantity::new("1.5.5").is_err());
        assert!(CpuQuantity::new("1m500").is_err());
        assert!(CpuQuantity::new("").is_err());
        assert!(CpuQuantity::new("  ").is_err());
        assert!(CpuQuantity::new("0m").is_err());
    }

    #[test]
    fn test_cpu_equality_is_by_input_string() {
        // "500m" and "0.5" both denote 500 milli-cores but remain distinct values.
        let milli = CpuQuantity::new("500m").unwrap();
        let decimal = CpuQuantity::new("0.5").unwrap();
        assert_ne!(milli, decimal);
        assert_eq!(milli.milli_cores(), decimal.milli_cores());
        assert_eq!(milli, CpuQuantity::new("500m").unwrap());
    }

    #[test]
    fn test_cpu_patch() {
        let q = CpuQuantity::new("0.5").unwrap();
        assert_eq!(q.patch(None).unwrap(), q);
        assert_eq!(q.patch(Some("")).unwrap(), q);
        assert_eq!(q.patch(Some("0.5")).unwrap(), q);
        assert_eq!(
            q.patch(Some("500m")).unwrap(),
            CpuQuantity::new("500m").unwrap()
        );
        assert!(q.patch(Some("bogus")).is_err());
    }

    #[test]
    fn test_memory_units() {
        assert_eq!(MemoryQuantity::new("128974848").unwrap().bytes(), 128974848);
        assert_eq!(MemoryQuantity::new("129M").unwrap().bytes(), 129_000_000);
        assert_eq!(MemoryQuantity::new("1Gi").unwrap().bytes(), 1 << 30);
        assert_eq!(MemoryQuantity::new("1K").unwrap().bytes(), 1000);
        assert_eq!(MemoryQuantity::new("2Ki").unwrap().bytes(), 2048);
    }

    #[test]
    fn test_memory_rejects_invalid() {
        assert!(MemoryQuantity::new("").is_err());
        assert!(MemoryQuantity::new("1gb").is_err());
        assert!(MemoryQuantity::new("1.5Gi").is_err());
        assert!(MemoryQuantity::new("Gi").is_err());
        assert!(MemoryQuantity::new("0").is_err());
    }

    #[test]
    fn test_memory_rejects_over_i64_max() {
        // 8 EiB = 2^63 bytes, one past the maximum representable quantity.
        assert!(MemoryQuantity::new("8Ei").is_err());
        assert!(MemoryQuantity::new("9223372036854775807").is_ok());
        assert!(MemoryQuantity::new("9223372036854775808").is_err());
    }

    #[test]
    fn test_memory_patch() {
        let q = MemoryQuantity::new("1Gi").unwrap();
        assert_eq!(q.patch(None).unwrap(), q);
        assert_eq!(
            q.patch(Some("512Mi")).unwrap(),
            MemoryQuantity::new("512Mi").unwrap()
        );
    }

    #[test]
    fn test_serde_as_string() {
        let q: CpuQuantity = serde_json::from_str("\"500m\"").unwrap();
        assert_eq!(q.milli_cores(), 500);
        assert_eq!(serde_json::to_string(&q).unwrap(), "\"500m\"");
        assert!(serde_json::from_str::<MemoryQuantity>("\"1gb\"").is_err());
    }
}
