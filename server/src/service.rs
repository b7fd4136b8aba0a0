//! Service façade: validated service creation and status lookup, delegated to
//! the configured deployment vendor.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

use x402_vendor::{
    DeployVendor, DeploymentConfig, DeploymentStatus, RunConfig, SourceConfig, VendorError,
};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-]+$").expect("valid regex"));

const NAME_MAX: usize = 32;
const URL_MAX: usize = 2048;
const BRANCH_MAX: usize = 64;
const DIR_MAX: usize = 128;

/// Validated command to create a service from a git repository.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceCreation {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub port: Option<u32>,
}

/// Result of a service creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCreated {
    pub id: String,
    pub name: String,
}

/// Status view of a deployed service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Vendor(#[from] VendorError),
}

/// Thin orchestration over the deployment vendor.
#[derive(Debug, Clone)]
pub struct Services<V> {
    vendor: V,
}

impl<V> Services<V>
where
    V: DeployVendor,
{
    pub fn new(vendor: V) -> Self {
        Self { vendor }
    }

    /// Validates the command, delegates to the vendor, and returns the
    /// vendor-assigned id together with the requested name.
    pub async fn create(&self, cmd: ServiceCreation) -> Result<ServiceCreated, ServiceError> {
        validate(&cmd)?;
        let config = to_deployment_config(&cmd);
        let id = self.vendor.deploy(&config).await?;
        Ok(ServiceCreated { id, name: cmd.name })
    }

    pub async fn status(&self, id: &str) -> Result<ServiceView, ServiceError> {
        let status = self.vendor.status(id).await?;
        Ok(to_view(status))
    }
}

fn validate(cmd: &ServiceCreation) -> Result<(), ServiceError> {
    let invalid = |message: &str| Err(ServiceError::Validation(message.to_string()));

    if !NAME_PATTERN.is_match(&cmd.name) {
        return invalid("Service name can only contain letters, numbers, and '-'");
    }
    if cmd.name.len() > NAME_MAX {
        return invalid("Service name must be less than or equal to 32 characters");
    }
    if cmd.url.trim().is_empty() {
        return invalid("Git url must not be blank");
    }
    if cmd.url.len() > URL_MAX {
        return invalid("Source URI must be less than or equal to 2048 characters");
    }
    if cmd.branch.as_deref().is_some_and(|b| b.len() > BRANCH_MAX) {
        return invalid("Source branch must be less than or equal to 64 characters");
    }
    if cmd.dir.as_deref().is_some_and(|d| d.len() > DIR_MAX) {
        return invalid("Source context directory must be less than or equal to 128 characters");
    }
    match cmd.port {
        Some(0) => return invalid("Port must be greater than 0"),
        Some(port) if port > u16::MAX as u32 => {
            return invalid("Port must be less than or equal to 65535");
        }
        _ => {}
    }
    Ok(())
}

fn to_deployment_config(cmd: &ServiceCreation) -> DeploymentConfig {
    DeploymentConfig {
        name: cmd.name.clone(),
        source: SourceConfig {
            git: cmd.url.clone(),
            branch: cmd.branch.clone(),
            dir: cmd.dir.clone(),
        },
        run: RunConfig {
            port: cmd.port.map(|p| p as u16),
            ..RunConfig::default()
        },
        build: Default::default(),
    }
}

fn to_view(status: DeploymentStatus) -> ServiceView {
    ServiceView {
        id: status.id,
        name: status.name,
        url: status.url,
        ready: status.ready,
        message: status.message,
        extra: status.extra,
    }
}
