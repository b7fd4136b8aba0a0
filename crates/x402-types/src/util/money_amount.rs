//! Human-readable currency amount parsing and atomic-unit conversion.
//!
//! A route's price is configured as a human-readable amount such as `"0.01"`.
//! On the wire the protocol wants atomic token units, i.e.
//! `floor(amount × 10^decimals)` rendered as a plain decimal integer string.
//! [`MoneyAmount`] handles both halves.
//!
//! # Supported Formats
//!
//! - Plain numbers: `"100"`, `"0.01"`
//! - With currency symbols: `"$10.50"`
//! - With thousand separators: `"1,000.50"`

use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

/// A parsed, non-negative monetary amount with decimal precision.
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyAmount(pub Decimal);

/// Errors that can occur when parsing or converting a monetary amount.
#[derive(Debug, thiserror::Error)]
pub enum MoneyAmountError {
    /// The input string could not be parsed as a number.
    #[error("Invalid number format")]
    InvalidFormat,
    /// The value is outside the allowed range.
    #[error(
        "Amount must be between {} and {}",
        constants::MIN_STR,
        constants::MAX_STR
    )]
    OutOfRange,
    /// Negative values are not allowed.
    #[error("Negative value is not allowed")]
    Negative,
}

mod constants {
    use super::*;

    pub const MIN_STR: &str = "0.000000001";
    pub const MAX_STR: &str = "999999999";

    pub static MIN: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MIN_STR).expect("valid decimal"));
    pub static MAX: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MAX_STR).expect("valid decimal"));
}

static CLEANUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\d\.\-]+").expect("valid regex"));

impl MoneyAmount {
    /// Parses a human-readable currency string.
    ///
    /// Currency symbols, thousand separators, and whitespace are stripped
    /// before parsing. The result must be a non-negative number within the
    /// allowed range.
    pub fn parse(input: &str) -> Result<Self, MoneyAmountError> {
        let cleaned = CLEANUP.replace_all(input, "");

        let parsed = Decimal::from_str(&cleaned).map_err(|_| MoneyAmountError::InvalidFormat)?;

        if parsed.is_sign_negative() {
            return Err(MoneyAmountError::Negative);
        }

        if parsed < *constants::MIN || parsed > *constants::MAX {
            return Err(MoneyAmountError::OutOfRange);
        }

        Ok(MoneyAmount(parsed))
    }

    /// Converts to atomic token units: `floor(amount × 10^decimals)`.
    ///
    /// Truncates toward zero and renders as a plain decimal integer string
    /// with no exponent, no sign, and no leading zeros (`"0"` stays `"0"`).
    pub fn atomic_units(&self, decimals: u32) -> Result<String, MoneyAmountError> {
        let factor = 10i128
            .checked_pow(decimals)
            .ok_or(MoneyAmountError::OutOfRange)?;
        let factor = Decimal::try_from_i128_with_scale(factor, 0)
            .map_err(|_| MoneyAmountError::OutOfRange)?;
        let atomic = self
            .0
            .checked_mul(factor)
            .ok_or(MoneyAmountError::OutOfRange)?
            .trunc();
        Ok(atomic.normalize().to_string())
    }
}

impl FromStr for MoneyAmount {
    type Err = MoneyAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoneyAmount::parse(s)
    }
}

impl Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
