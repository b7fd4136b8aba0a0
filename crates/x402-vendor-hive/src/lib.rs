//! Hive adapter for the vendor deployment SPI.
//!
//! Translates the canonical [`x402_vendor::DeploymentConfig`] into Hive's
//! service-creation schema, talks to the Hive HTTP API, and maps Hive's
//! response envelope and error shapes back into SPI terms.

pub mod client;
pub mod convert;
pub mod deployer;
pub mod wire;

pub use client::{HiveClient, HiveConfig};
pub use deployer::HiveDeployer;
