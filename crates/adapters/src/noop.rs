// SPDX-License-Identifier: MIT

//! No-op cloud client for stacks that never touch a cloud provider.

use async_trait::async_trait;
use gantry_core::cloud::{
    AwsCredentials, CloudClient, CloudError, RegistryAuth, ServiceUpdate, TaskDefinition,
};

/// Every call fails; used where a cloud client is required by the type
/// system but must never be reached.
#[derive(Clone, Default)]
pub struct NoOpCloudClient;

impl NoOpCloudClient {
    pub fn new() -> Self {
        Self
    }

    fn unavailable() -> CloudError {
        CloudError::Credentials("no cloud client configured for this stack".to_string())
    }
}

#[async_trait]
impl CloudClient for NoOpCloudClient {
    async fn credentials(&self) -> Result<AwsCredentials, CloudError> {
        Err(Self::unavailable())
    }

    async fn registry_login(
        &self,
        _registry: &str,
        _credentials: &AwsCredentials,
    ) -> Result<RegistryAuth, CloudError> {
        Err(Self::unavailable())
    }

    async fn describe_task_definition(&self, _family: &str) -> Result<TaskDefinition, CloudError> {
        Err(Self::unavailable())
    }

    async fn register_task_definition(
        &self,
        _definition: &TaskDefinition,
    ) -> Result<String, CloudError> {
        Err(Self::unavailable())
    }

    async fn update_service(&self, _update: &ServiceUpdate) -> Result<(), CloudError> {
        Err(Self::unavailable())
    }
}
