//! Vendor-agnostic deployment SPI.
//!
//! A paid request ultimately triggers a serverless deployment on some
//! third-party provider. This crate defines the canonical deployment data
//! model ([`DeploymentConfig`], [`DeploymentStatus`]), the resource-quantity
//! value objects used inside it ([`CpuQuantity`], [`MemoryQuantity`]), and
//! the [`DeployVendor`] trait that concrete provider adapters implement.

pub mod deployment;
pub mod quantity;

pub use deployment::*;
pub use quantity::*;
