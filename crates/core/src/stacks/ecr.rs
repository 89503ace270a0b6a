// SPDX-License-Identifier: MIT

//! The ECR stack: build the image and push it to a registry.

use super::{docker::DOCKERFILE, required};
use crate::cloud::{AwsCredentials, CloudClient};
use crate::dispatch::{ActionPhase, Output};
use crate::engine::Engine;
use crate::env::{AWS_ACCESS_KEY_ID, AWS_REGION, AWS_SECRET_ACCESS_KEY};
use crate::error::ActionError;
use crate::id::random_suffix;
use crate::task::TaskContext;

const RANDOM_TAG_LEN: usize = 5;

/// Build the image from the mounted directory and publish it as
/// `<registry>/<repository>:<tag>`.
#[derive(Debug, Default)]
pub struct PushAction;

impl PushAction {
    pub fn new() -> Self {
        Self
    }

    pub async fn run<E: Engine, C: CloudClient>(
        &self,
        ctx: &TaskContext<'_, E, C>,
    ) -> Result<Output, ActionError> {
        let task = ctx.task;
        let params = ctx.params;

        let registry = required(&params.registry, "registry")?;
        let repository = required(&params.repository, "repository")?;
        let tag = resolve_tag(params.tag.as_deref(), params.generate_random_tag)?;
        let credentials = credentials_from_layer(ctx)?;
        let address = format!("{registry}/{repository}:{tag}");
        tracing::debug!(task = %task.name, phase = %ActionPhase::Configured, %address, "ecr push");

        let entries = ctx.verify_entries(&[DOCKERFILE]).await?;
        tracing::debug!(task = %task.name, phase = %ActionPhase::DirectoryVerified, "ecr push");

        let mounted = ctx.mount().await?;
        let mounted = ctx.with_task_env(mounted).await?;
        tracing::debug!(task = %task.name, phase = %ActionPhase::Mounted, "ecr push");

        tracing::debug!(task = %task.name, phase = %ActionPhase::Executing, "ecr push");
        let built = ctx.engine.build(&mounted, &task.dirs.mount_handle).await?;

        // Vendor automation environments log in to the registry on
        // their own; only authenticate from here when running outside
        // one.
        let publishable = if params.vendor_automation {
            built
        } else {
            let auth = ctx.cloud.registry_login(registry, &credentials).await?;
            ctx.engine
                .with_registry_auth(&built, registry, &auth.username, &auth.secret)
                .await?
        };

        let digest = ctx.engine.publish(&publishable, &address).await?;

        tracing::info!(task = %task.name, phase = %ActionPhase::Succeeded, %digest, "ecr push");
        Ok(Output {
            exit_code: 0,
            files: entries,
            directories: vec![task.dirs.mount_handle.clone()],
            detail: Some(digest),
            is_error: false,
            env: task.env.clone(),
        })
    }
}

/// Tag precedence: an explicit tag and a random-tag request together
/// are contradictory; a random tag when asked; `latest` otherwise.
fn resolve_tag(tag: Option<&str>, generate_random: bool) -> Result<String, ActionError> {
    let explicit = tag.map(str::trim).filter(|t| !t.is_empty());
    match (explicit, generate_random) {
        (Some(_), true) => Err(ActionError::Configuration(
            "an explicit tag and a generated tag cannot both be requested".to_string(),
        )),
        (Some(t), false) => Ok(t.to_string()),
        (None, true) => Ok(random_suffix(RANDOM_TAG_LEN)),
        (None, false) => Ok("latest".to_string()),
    }
}

/// The credentials the job's aws layer scanned. An empty layer means
/// the pipeline ran without the aws toggle.
fn credentials_from_layer<E: Engine, C: CloudClient>(
    ctx: &TaskContext<'_, E, C>,
) -> Result<AwsCredentials, ActionError> {
    let aws = &ctx.task.layers.aws;
    let get = |key: &str| {
        aws.get(key).cloned().ok_or_else(|| {
            ActionError::Configuration(format!("{key} is not present in the scanned environment"))
        })
    };
    Ok(AwsCredentials {
        access_key_id: get(AWS_ACCESS_KEY_ID)?,
        secret_access_key: get(AWS_SECRET_ACCESS_KEY)?,
        region: aws.get(AWS_REGION).cloned().unwrap_or_default(),
    })
}

#[cfg(test)]
#[path = "ecr_tests.rs"]
mod tests;
