// SPDX-License-Identifier: MIT

//! The ECS stack: point a service at a freshly registered task
//! definition carrying the new image.

use super::required;
use crate::cloud::{image_with_tag, CloudClient, ServiceUpdate};
use crate::dispatch::{ActionPhase, Output};
use crate::engine::Engine;
use crate::error::ActionError;
use crate::task::TaskContext;

/// Rewrite the task definition's container images and roll the service.
#[derive(Debug, Default)]
pub struct DeployAction;

impl DeployAction {
    pub fn new() -> Self {
        Self
    }

    pub async fn run<E: Engine, C: CloudClient>(
        &self,
        ctx: &TaskContext<'_, E, C>,
    ) -> Result<Output, ActionError> {
        let task = ctx.task;
        let params = ctx.params;

        let cluster = required(&params.cluster, "cluster")?;
        let service = required(&params.service, "service")?;
        let family = required(&params.task_definition, "task-definition")?;
        let image = required(&params.image, "image")?;
        let version = params.version.as_deref().unwrap_or("");
        tracing::debug!(task = %task.name, phase = %ActionPhase::Configured, %service, "ecs deploy");

        tracing::debug!(task = %task.name, phase = %ActionPhase::Executing, "ecs deploy");
        let mut definition = ctx.cloud.describe_task_definition(family).await?;
        let new_image = image_with_tag(image, version);
        for container in &mut definition.container_definitions {
            container.image = new_image.clone();
        }

        let arn = ctx.cloud.register_task_definition(&definition).await?;
        ctx.cloud
            .update_service(&ServiceUpdate {
                cluster: cluster.to_string(),
                service: service.to_string(),
                task_definition_arn: arn.clone(),
                force_new_deployment: params.force_new_deployment,
            })
            .await?;

        tracing::info!(task = %task.name, phase = %ActionPhase::Succeeded, %arn, "ecs deploy");
        Ok(Output {
            exit_code: 0,
            files: Vec::new(),
            directories: Vec::new(),
            detail: Some(arn),
            is_error: false,
            env: task.env.clone(),
        })
    }
}

#[cfg(test)]
#[path = "ecs_tests.rs"]
mod tests;
