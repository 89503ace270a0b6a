// SPDX-License-Identifier: MIT

//! Capability trait for cloud provider clients.
//!
//! Credential resolution, container-registry login, and the
//! task-definition/service calls used by the deploy stack. All calls
//! are opaque request/response; adapters decide how to reach the
//! provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resolved cloud credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

/// Registry login material returned by the provider.
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    pub username: String,
    pub secret: String,
}

/// One container definition inside a task definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub name: String,
    pub image: String,
}

/// The subset of a container-service task definition gantry rewrites
/// when deploying a new image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    pub container_definitions: Vec<ContainerDefinition>,
}

/// Parameters for a service update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUpdate {
    pub cluster: String,
    pub service: String,
    pub task_definition_arn: String,
    pub force_new_deployment: bool,
}

/// Errors from cloud clients
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("cloud credentials could not be resolved: {0}")]
    Credentials(String),
    #[error("registry login against {registry} failed: {detail}")]
    Login { registry: String, detail: String },
    #[error("task definition {family} could not be fetched: {detail}")]
    TaskDefinition { family: String, detail: String },
    #[error("task definition registration failed: {0}")]
    Register(String),
    #[error("service {service} update failed: {detail}")]
    UpdateService { service: String, detail: String },
    #[error("cloud cli call {op} failed: {detail}")]
    Cli { op: &'static str, detail: String },
    #[error("malformed cloud response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("cloud call {op} timed out after {seconds}s")]
    Timeout { op: &'static str, seconds: u64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The cloud-client capability surface.
#[async_trait]
pub trait CloudClient: Clone + Send + Sync + 'static {
    /// Resolve credentials for the current invocation.
    async fn credentials(&self) -> Result<AwsCredentials, CloudError>;

    /// Obtain registry login material.
    async fn registry_login(
        &self,
        registry: &str,
        credentials: &AwsCredentials,
    ) -> Result<RegistryAuth, CloudError>;

    /// Fetch the latest revision of a task definition family.
    async fn describe_task_definition(&self, family: &str) -> Result<TaskDefinition, CloudError>;

    /// Register an updated task definition, returning its ARN.
    async fn register_task_definition(
        &self,
        definition: &TaskDefinition,
    ) -> Result<String, CloudError>;

    /// Point a service at a new task definition.
    async fn update_service(&self, update: &ServiceUpdate) -> Result<(), CloudError>;
}

/// Append a tag to an image URL when it carries none: the explicit
/// version if given, `latest` otherwise.
pub fn image_with_tag(image: &str, version: &str) -> String {
    let image = image.trim();
    let version = version.trim();
    if image.contains(':') {
        return image.to_string();
    }
    if version.is_empty() {
        format!("{image}:latest")
    } else {
        format!("{image}:{version}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_with_tag_appends_version_or_latest() {
        assert_eq!(image_with_tag("repo/app", ""), "repo/app:latest");
        assert_eq!(image_with_tag("repo/app", "v2"), "repo/app:v2");
        assert_eq!(image_with_tag("repo/app:v1", "v2"), "repo/app:v1");
    }

    #[test]
    fn task_definition_round_trips_camel_case() {
        let json = r#"{
            "family": "svc",
            "networkMode": "awsvpc",
            "containerDefinitions": [{"name": "app", "image": "repo/app:v1"}]
        }"#;
        let def: TaskDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.family, "svc");
        assert_eq!(def.container_definitions[0].image, "repo/app:v1");
        let out = serde_json::to_string(&def).unwrap();
        assert!(out.contains("containerDefinitions"));
        assert!(!out.contains("taskRoleArn")); // skipped when absent
    }
}
