//! [`DeployVendor`] implementation backed by the Hive API.

use x402_vendor::{DeployVendor, DeploymentConfig, DeploymentStatus, VendorError};

use crate::client::{HiveClient, VENDOR_ERROR};
use crate::convert;

/// Deploys services to Hive and reports their status.
#[derive(Debug, Clone)]
pub struct HiveDeployer {
    client: HiveClient,
}

impl HiveDeployer {
    pub fn new(client: HiveClient) -> Self {
        Self { client }
    }
}

impl DeployVendor for HiveDeployer {
    async fn deploy(&self, config: &DeploymentConfig) -> Result<String, VendorError> {
        let request = convert::to_create_request(config);
        let response = self.client.create_service(&request).await?;

        if !response.success {
            tracing::error!(
                name = %config.name,
                code = ?response.err_code,
                message = ?response.err_message,
                "failed to deploy service to hive"
            );
            return Err(VendorError::new(
                VENDOR_ERROR,
                "Failed to deploy service to hive.",
            ));
        }

        response
            .data
            .map(|data| data.id)
            .ok_or_else(|| VendorError::new(VENDOR_ERROR, "Hive response missing service id"))
    }

    async fn status(&self, id: &str) -> Result<DeploymentStatus, VendorError> {
        let response = self.client.service_by_id(id).await?;

        // Vendor-reported failures come back as a non-ready status, not an error.
        if !response.success {
            return Ok(DeploymentStatus {
                id: id.to_string(),
                ready: false,
                message: response.err_message,
                ..DeploymentStatus::default()
            });
        }
        let Some(data) = response.data else {
            return Ok(DeploymentStatus {
                id: id.to_string(),
                ready: false,
                message: Some("Hive response missing service data".to_string()),
                ..DeploymentStatus::default()
            });
        };
        Ok(convert::to_status(data))
    }
}
