//! Configuration module for the function gateway server.
//!
//! Configuration is loaded from a JSON file (default: `config.json`):
//!
//! ```json
//! {
//!   "port": 8080,
//!   "host": "0.0.0.0",
//!   "base_url": "https://functions.example.com",
//!   "x402": {
//!     "enabled": true,
//!     "default_pay_to": "0xYourAddress",
//!     "facilitator_base_url": "https://facilitator.example.com"
//!   },
//!   "hive": {
//!     "base_url": "https://api.hive.example.com",
//!     "account": "acct-42",
//!     "token": "$HIVE_API_TOKEN"
//!   }
//! }
//! ```
//!
//! `port` and `host` fall back to the `PORT` and `HOST` environment variables,
//! then to `8080` / `0.0.0.0`. Secret-bearing hive values support `$VAR`
//! environment references.

use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use url::Url;

use x402_axum::X402Config;
use x402_vendor_hive::HiveConfig;

/// CLI arguments for the function gateway server.
#[derive(Parser, Debug)]
#[command(name = "function-server")]
#[command(about = "x402-paid serverless function gateway")]
struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

/// Server configuration.
///
/// Fields use serde defaults that fall back to environment variables,
/// then to hardcoded defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "config_defaults::default_port")]
    port: u16,
    #[serde(default = "config_defaults::default_host")]
    host: IpAddr,
    /// Public origin used to build fully-qualified resource URLs in payment
    /// requirements.
    #[serde(default)]
    base_url: Option<Url>,
    #[serde(default)]
    x402: X402Config,
    hive: HiveConfig,
}

pub mod config_defaults {
    use std::env;
    use std::net::IpAddr;

    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    /// Returns the default port value with fallback: $PORT env var -> 8080
    pub fn default_port() -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    /// Returns the default host value with fallback: $HOST env var -> "0.0.0.0"
    pub fn default_host() -> IpAddr {
        env::var("HOST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(IpAddr::V4(DEFAULT_HOST.parse().unwrap()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn x402(&self) -> &X402Config {
        &self.x402
    }

    pub fn hive(&self) -> &HiveConfig {
        &self.hive
    }

    /// Load configuration from CLI arguments and JSON file.
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        let config_path = Path::new(&cli_args.config)
            .canonicalize()
            .map_err(|e| ConfigError::FileRead(cli_args.config, e))?;
        Self::load_from_path(config_path)
    }

    fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path, e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: Config = serde_json::from_str(
            r#"{
                "hive": {
                    "base_url": "https://api.hive.example.com",
                    "account": "acct-42",
                    "token": "secret"
                }
            }"#,
        )
        .unwrap();
        assert!(!config.x402().enabled);
        assert!(config.hive().enabled);
        assert_eq!(config.hive().account, "acct-42");
        assert!(config.base_url().is_none());
    }

    #[test]
    fn test_full_config() {
        let config: Config = serde_json::from_str(
            r#"{
                "port": 9000,
                "host": "127.0.0.1",
                "base_url": "https://functions.example.com",
                "x402": {
                    "enabled": true,
                    "default_pay_to": "0xPayee",
                    "facilitator_base_url": "https://facilitator.example.com"
                },
                "hive": {
                    "base_url": "https://api.hive.example.com",
                    "account": "acct-42",
                    "token_header_name": "X-Hive-Token",
                    "token": "secret"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.port(), 9000);
        assert!(config.x402().enabled);
        assert_eq!(
            config.x402().facilitator_base_url.as_deref(),
            Some("https://facilitator.example.com")
        );
        assert_eq!(config.hive().token_header_name, "X-Hive-Token");
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "https://functions.example.com/"
        );
    }
}
