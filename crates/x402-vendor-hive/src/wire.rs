//! Hive's HTTP wire schema.
//!
//! All fields serialize with camelCase names, matching the vendor API.
//! Optional fields are omitted rather than sent as null.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hive's uniform response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// `POST /services` request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceCreateRequest {
    pub name: String,
    pub configuration: Configuration,
}

/// Service configuration in Hive terms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub source_type: String,
    pub source_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_context_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub envs: Vec<EnvEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,
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
    pub docker_config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pvc_size: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_envs: Vec<EnvEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvEntry {
    pub name: String,
    pub value: String,
}

/// `POST /services` result payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceCreateResult {
    pub id: String,
}

/// `GET /services/{id}` result payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResult {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Per-component deployment states, passed through verbatim.
    #[serde(default)]
    pub deploy_statuses: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let parsed: HiveResponse<ServiceCreateResult> = serde_json::from_value(json!({
            "success": true,
            "data": { "id": "svc-123" }
        }))
        .unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.data.unwrap().id, "svc-123");
    }

    #[test]
    fn test_error_envelope() {
        let parsed: HiveResponse<ServiceCreateResult> = serde_json::from_value(json!({
            "success": false,
            "errCode": "SERVICE_NOT_FOUND",
            "errMessage": "Service not found"
        }))
        .unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.err_code.as_deref(), Some("SERVICE_NOT_FOUND"));
        assert!(parsed.data.is_none());
    }

    #[test]
    fn test_create_request_shape() {
        let request = ServiceCreateRequest {
            name: "demo".to_string(),
            configuration: Configuration {
                source_type: "GIT".to_string(),
                source_uri: "https://github.com/example/app.git".to_string(),
                source_branch: Some("main".to_string()),
                port: Some(8081),
                ..Configuration::default()
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["name"], "demo");
        assert_eq!(value["configuration"]["sourceType"], "GIT");
        assert_eq!(value["configuration"]["sourceBranch"], "main");
        assert_eq!(value["configuration"]["port"], 8081);
        // unset optionals are omitted
        assert!(value["configuration"].get("cpuRequest").is_none());
        assert!(value["configuration"].get("envs").is_none());
    }

    #[test]
    fn test_service_result_tolerates_missing_fields() {
        let parsed: ServiceResult =
            serde_json::from_value(json!({ "id": "svc-123" })).unwrap();
        assert_eq!(parsed.id, "svc-123");
        assert!(!parsed.ready);
        assert!(parsed.deploy_statuses.is_none());
    }
}
