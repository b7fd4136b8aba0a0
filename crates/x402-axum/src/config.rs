//! Payment-gate configuration.
//!
//! All values are read once at startup and shared read-only across requests.
//! Fields use serde defaults so a config file only needs to name what it
//! changes.

use serde::Deserialize;
use serde_json::Value;

/// Configuration for the x402 payment gate.
#[derive(Debug, Clone, Deserialize)]
pub struct X402Config {
    /// Gate for the whole interceptor. When false, routes are served unpaid.
    #[serde(default)]
    pub enabled: bool,
    /// Payment scheme identifier.
    #[serde(default = "config_defaults::default_scheme")]
    pub scheme: String,
    /// Network identifier.
    #[serde(default = "config_defaults::default_network")]
    pub network: String,
    /// Token contract address.
    #[serde(default = "config_defaults::default_asset")]
    pub asset: String,
    /// Decimals used for atomic-unit conversion.
    #[serde(default = "config_defaults::default_asset_decimals")]
    pub asset_decimals: u32,
    /// Fallback recipient address; routes may override per-tag.
    #[serde(default)]
    pub default_pay_to: Option<String>,
    /// Maximum payment completion time, copied into every requirement.
    #[serde(default = "config_defaults::default_max_timeout_seconds")]
    pub max_timeout_seconds: u64,
    /// MIME type of the protected responses.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// JSON schema describing the response format.
    #[serde(default)]
    pub output_schema: Option<Value>,
    /// Scheme-specific extra object, e.g. an EIP-712 domain.
    #[serde(default)]
    pub extra: Option<Value>,
    /// Facilitator base URL; required when the gate is enabled.
    #[serde(default)]
    pub facilitator_base_url: Option<String>,
}

impl Default for X402Config {
    fn default() -> Self {
        Self {
            enabled: false,
            scheme: config_defaults::default_scheme(),
            network: config_defaults::default_network(),
            asset: config_defaults::default_asset(),
            asset_decimals: config_defaults::default_asset_decimals(),
            default_pay_to: None,
            max_timeout_seconds: config_defaults::default_max_timeout_seconds(),
            mime_type: None,
            output_schema: None,
            extra: None,
            facilitator_base_url: None,
        }
    }
}

pub mod config_defaults {
    /// USDC on Base Sepolia.
    pub const DEFAULT_ASSET: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";

    pub fn default_scheme() -> String {
        "exact".to_string()
    }

    pub fn default_network() -> String {
        "base-sepolia".to_string()
    }

    pub fn default_asset() -> String {
        DEFAULT_ASSET.to_string()
    }

    pub fn default_asset_decimals() -> u32 {
        6
    }

    pub fn default_max_timeout_seconds() -> u64 {
        30
    }
}
