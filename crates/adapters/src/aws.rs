// SPDX-License-Identifier: MIT

//! AWS CLI cloud client.
//!
//! Credentials come from the scanned environment, never from the
//! ambient process state of the call site. Every CLI invocation runs
//! with the credentials exported explicitly and a timeout applied.

use async_trait::async_trait;
use gantry_core::cloud::{
    AwsCredentials, CloudClient, CloudError, RegistryAuth, ServiceUpdate, TaskDefinition,
};
use gantry_core::env::{AWS_ACCESS_KEY_ID, AWS_REGION, AWS_SECRET_ACCESS_KEY, EnvMap};
use std::time::Duration;
use tokio::process::Command;

const CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Cloud client backed by the local aws binary.
#[derive(Clone)]
pub struct AwsCliClient {
    credentials: AwsCredentials,
}

impl AwsCliClient {
    pub fn new(credentials: AwsCredentials) -> Self {
        Self { credentials }
    }

    /// Build a client from a scanned aws environment layer.
    pub fn from_env_layer(layer: &EnvMap) -> Result<Self, CloudError> {
        let get = |key: &str| {
            layer
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| CloudError::Credentials(format!("{key} is not set")))
        };
        Ok(Self::new(AwsCredentials {
            access_key_id: get(AWS_ACCESS_KEY_ID)?,
            secret_access_key: get(AWS_SECRET_ACCESS_KEY)?,
            // The region is optional; the aws cli falls back to its own
            // configuration when it is empty.
            region: layer.get(AWS_REGION).cloned().unwrap_or_default(),
        }))
    }

    async fn run_aws(&self, args: &[String], op: &'static str) -> Result<String, CloudError> {
        tracing::debug!(?args, "aws invocation");
        let future = Command::new("aws")
            .args(args)
            .env(AWS_ACCESS_KEY_ID, &self.credentials.access_key_id)
            .env(AWS_SECRET_ACCESS_KEY, &self.credentials.secret_access_key)
            .env(AWS_REGION, &self.credentials.region)
            .output();
        let output = match tokio::time::timeout(CALL_TIMEOUT, future).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(CloudError::Timeout {
                    op,
                    seconds: CALL_TIMEOUT.as_secs(),
                })
            }
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CloudError::Cli {
                op,
                detail: stderr.trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Pull the `taskDefinition` object out of an AWS CLI response.
fn task_definition_from_response(raw: &str) -> Result<TaskDefinition, CloudError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let inner = value
        .get("taskDefinition")
        .cloned()
        .unwrap_or(value);
    Ok(serde_json::from_value(inner)?)
}

/// Pull the registered ARN out of an AWS CLI response.
fn arn_from_response(raw: &str) -> Result<String, CloudError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    value
        .pointer("/taskDefinition/taskDefinitionArn")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CloudError::Register("response carries no taskDefinitionArn".to_string()))
}

#[async_trait]
impl CloudClient for AwsCliClient {
    async fn credentials(&self) -> Result<AwsCredentials, CloudError> {
        Ok(self.credentials.clone())
    }

    async fn registry_login(
        &self,
        registry: &str,
        _credentials: &AwsCredentials,
    ) -> Result<RegistryAuth, CloudError> {
        let args = vec!["ecr".to_string(), "get-login-password".to_string()];
        let password = self.run_aws(&args, "registry-login").await.map_err(|e| {
            CloudError::Login {
                registry: registry.to_string(),
                detail: e.to_string(),
            }
        })?;
        Ok(RegistryAuth {
            username: "AWS".to_string(),
            secret: password.trim().to_string(),
        })
    }

    async fn describe_task_definition(&self, family: &str) -> Result<TaskDefinition, CloudError> {
        let args = vec![
            "ecs".to_string(),
            "describe-task-definition".to_string(),
            "--task-definition".to_string(),
            family.to_string(),
            "--output".to_string(),
            "json".to_string(),
        ];
        let raw = self
            .run_aws(&args, "describe-task-definition")
            .await
            .map_err(|e| CloudError::TaskDefinition {
                family: family.to_string(),
                detail: e.to_string(),
            })?;
        task_definition_from_response(&raw)
    }

    async fn register_task_definition(
        &self,
        definition: &TaskDefinition,
    ) -> Result<String, CloudError> {
        let input = serde_json::to_string(definition)?;
        let args = vec![
            "ecs".to_string(),
            "register-task-definition".to_string(),
            "--cli-input-json".to_string(),
            input,
            "--output".to_string(),
            "json".to_string(),
        ];
        let raw = self
            .run_aws(&args, "register-task-definition")
            .await
            .map_err(|e| CloudError::Register(e.to_string()))?;
        arn_from_response(&raw)
    }

    async fn update_service(&self, update: &ServiceUpdate) -> Result<(), CloudError> {
        let mut args = vec![
            "ecs".to_string(),
            "update-service".to_string(),
            "--cluster".to_string(),
            update.cluster.clone(),
            "--service".to_string(),
            update.service.clone(),
            "--task-definition".to_string(),
            update.task_definition_arn.clone(),
        ];
        if update.force_new_deployment {
            args.push("--force-new-deployment".to_string());
        }
        self.run_aws(&args, "update-service")
            .await
            .map_err(|e| CloudError::UpdateService {
                service: update.service.clone(),
                detail: e.to_string(),
            })?;
        Ok(())
    }
}
