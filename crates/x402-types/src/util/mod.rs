//! Utility types shared across the x402 server crates.
//!
//! - [`b64`] - Base64 encoding/decoding utilities
//! - [`money_amount`] - Human-readable currency amount parsing and
//!   atomic-unit conversion

pub mod b64;
pub mod money_amount;

pub use b64::*;
pub use money_amount::*;
