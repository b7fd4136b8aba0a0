//! Canonical deployment data model and the provider SPI.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::quantity::{CpuQuantity, MemoryQuantity};

/// A vendor-side failure, carrying the vendor's error code and message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct VendorError {
    pub code: String,
    pub message: String,
}

impl VendorError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A single environment variable passed to a build or a running service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Where the service's code comes from. Only git sources are supported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Git repository URL.
    pub git: String,
    /// Branch to build; the vendor's default branch when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Context directory within the repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Runtime settings for a deployed service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub envs: Vec<EnvVar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_request: Option<CpuQuantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_request: Option<MemoryQuantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<CpuQuantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<MemoryQuantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_scale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_scale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pvc_size: Option<MemoryQuantity>,
}

/// Build-time settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_config: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_envs: Vec<EnvVar>,
}

/// The canonical, vendor-agnostic deployment request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub name: String,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

/// Best-effort status of a deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Vendor-specific detail, e.g. per-component deployment states.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, Value>,
}

/// A pluggable deployment provider.
///
/// `status` reports vendor-*declared* failures inside the returned
/// [`DeploymentStatus`] (`ready = false` plus a message) rather than as an
/// `Err`; only transport and protocol breakdowns surface as [`VendorError`].
pub trait DeployVendor: Send + Sync {
    /// Deploys a service, returning the vendor-assigned id.
    fn deploy(
        &self,
        config: &DeploymentConfig,
    ) -> impl Future<Output = Result<String, VendorError>> + Send;

    /// Fetches the current status of a deployment by vendor id.
    fn status(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<DeploymentStatus, VendorError>> + Send;
}
