//! Translation between the canonical deployment model and Hive's schema.

use std::collections::HashMap;

use x402_vendor::{DeploymentConfig, DeploymentStatus, EnvVar};

use crate::wire::{Configuration, EnvEntry, ServiceCreateRequest, ServiceResult};

/// Hive's identifier for git-backed sources. The only source type supported.
const SOURCE_TYPE_GIT: &str = "GIT";

pub fn to_create_request(config: &DeploymentConfig) -> ServiceCreateRequest {
    let source = &config.source;
    let run = &config.run;
    let build = &config.build;
    ServiceCreateRequest {
        name: config.name.clone(),
        configuration: Configuration {
            source_type: SOURCE_TYPE_GIT.to_string(),
            source_uri: source.git.clone(),
            source_branch: source.branch.clone(),
            source_context_dir: source.dir.clone(),
            port: run.port,
            envs: run.envs.iter().map(env_entry).collect(),
            concurrency_limit: run.concurrency_limit,
            readiness_probe: run.readiness_probe.clone(),
            liveness_probe: run.liveness_probe.clone(),
            cpu_request: run.cpu_request.as_ref().map(|q| q.as_str().to_string()),
            memory_request: run.memory_request.as_ref().map(|q| q.as_str().to_string()),
            cpu_limit: run.cpu_limit.as_ref().map(|q| q.as_str().to_string()),
            memory_limit: run.memory_limit.as_ref().map(|q| q.as_str().to_string()),
            min_scale: run.min_scale,
            max_scale: run.max_scale,
            init_scale: run.init_scale,
            window_scale: run.window_scale.clone(),
            metric: run.metric.clone(),
            target: run.target,
            utilization: run.utilization,
            docker_config: build.docker_config.clone(),
            pvc_size: run.pvc_size.as_ref().map(|q| q.as_str().to_string()),
            build_envs: build.build_envs.iter().map(env_entry).collect(),
        },
    }
}

fn env_entry(env: &EnvVar) -> EnvEntry {
    EnvEntry {
        name: env.name.clone(),
        value: env.value.clone(),
    }
}

pub fn to_status(result: ServiceResult) -> DeploymentStatus {
    let mut extra = HashMap::new();
    if let Some(details) = result.deploy_statuses {
        extra.insert("details".to_string(), details);
    }
    DeploymentStatus {
        id: result.id,
        name: result.name,
        url: result.url,
        ready: result.ready,
        message: result.message,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use x402_vendor::{BuildConfig, CpuQuantity, MemoryQuantity, RunConfig, SourceConfig};

    #[test]
    fn test_to_create_request_maps_all_sections() {
        let config = DeploymentConfig {
            name: "demo-app".to_string(),
            source: SourceConfig {
                git: "https://github.com/example/app.git".to_string(),
                branch: Some("main".to_string()),
                dir: Some("backend".to_string()),
            },
            run: RunConfig {
                port: Some(8081),
                envs: vec![EnvVar {
                    name: "MODE".to_string(),
                    value: "prod".to_string(),
                }],
                concurrency_limit: Some(16),
                cpu_request: Some(CpuQuantity::new("500m").unwrap()),
                memory_request: Some(MemoryQuantity::new("512Mi").unwrap()),
                cpu_limit: Some(CpuQuantity::new("1").unwrap()),
                memory_limit: Some(MemoryQuantity::new("1Gi").unwrap()),
                min_scale: Some(0),
                max_scale: Some(3),
                pvc_size: Some(MemoryQuantity::new("10Gi").unwrap()),
                ..RunConfig::default()
            },
            build: BuildConfig {
                docker_config: Some("Dockerfile".to_string()),
                build_envs: vec![EnvVar {
                    name: "NODE_ENV".to_string(),
                    value: "production".to_string(),
                }],
            },
        };

        let request = to_create_request(&config);
        assert_eq!(request.name, "demo-app");
        let c = &request.configuration;
        assert_eq!(c.source_type, "GIT");
        assert_eq!(c.source_uri, "https://github.com/example/app.git");
        assert_eq!(c.source_branch.as_deref(), Some("main"));
        assert_eq!(c.source_context_dir.as_deref(), Some("backend"));
        assert_eq!(c.port, Some(8081));
        assert_eq!(c.envs[0].name, "MODE");
        assert_eq!(c.cpu_request.as_deref(), Some("500m"));
        assert_eq!(c.memory_request.as_deref(), Some("512Mi"));
        assert_eq!(c.cpu_limit.as_deref(), Some("1"));
        assert_eq!(c.memory_limit.as_deref(), Some("1Gi"));
        assert_eq!(c.pvc_size.as_deref(), Some("10Gi"));
        assert_eq!(c.docker_config.as_deref(), Some("Dockerfile"));
        assert_eq!(c.build_envs[0].value, "production");
    }

    #[test]
    fn test_to_status_places_details_in_extra() {
        let result = ServiceResult {
            id: "svc-123".to_string(),
            name: Some("demo-app".to_string()),
            url: Some("https://demo-app.hive.example.com".to_string()),
            ready: true,
            message: None,
            deploy_statuses: Some(json!([{"component": "web", "state": "Running"}])),
        };
        let status = to_status(result);
        assert_eq!(status.id, "svc-123");
        assert!(status.ready);
        assert_eq!(
            status.extra["details"][0]["state"],
            json!("Running")
        );
    }

    #[test]
    fn test_to_status_without_details() {
        let result = ServiceResult {
            id: "svc-123".to_string(),
            name: None,
            url: None,
            ready: false,
            message: Some("building".to_string()),
            deploy_statuses: None,
        };
        let status = to_status(result);
        assert!(status.extra.is_empty());
        assert_eq!(status.message.as_deref(), Some("building"));
    }
}
