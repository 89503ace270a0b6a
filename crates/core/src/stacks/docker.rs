// SPDX-License-Identifier: MIT

//! The docker stack: build an image from the mounted directory.

use crate::cloud::CloudClient;
use crate::dispatch::{ActionPhase, Output};
use crate::engine::Engine;
use crate::error::ActionError;
use crate::task::TaskContext;

use crate::task::CommandSet;

pub const DOCKERFILE: &str = "Dockerfile";

/// Sanity commands run inside the mounted container when the caller
/// supplies none.
fn default_commands() -> Vec<Vec<String>> {
    vec![
        vec!["ls".to_string(), "-ltrh".to_string()],
        vec!["cat".to_string(), DOCKERFILE.to_string()],
    ]
}

/// Build an image from the `Dockerfile` in the directory to mount.
#[derive(Debug, Default)]
pub struct BuildAction;

impl BuildAction {
    pub fn new() -> Self {
        Self
    }

    pub async fn run<E: Engine, C: CloudClient>(
        &self,
        ctx: &TaskContext<'_, E, C>,
    ) -> Result<Output, ActionError> {
        let task = ctx.task;
        tracing::debug!(task = %task.name, phase = %ActionPhase::Configured, "docker build");

        let entries = ctx.verify_entries(&[DOCKERFILE]).await?;
        tracing::debug!(task = %task.name, phase = %ActionPhase::DirectoryVerified, "docker build");

        let mounted = ctx.mount().await?;
        let mounted = ctx.with_task_env(mounted).await?;
        tracing::debug!(task = %task.name, phase = %ActionPhase::Mounted, "docker build");

        tracing::debug!(task = %task.name, phase = %ActionPhase::Executing, "docker build");
        let commands = CommandSet {
            default: default_commands(),
            custom: task.commands.custom.clone(),
        };
        ctx.run_commands(mounted, commands.effective(), false).await?;
        ctx.engine.build(&mounted, &task.dirs.mount_handle).await?;

        tracing::info!(task = %task.name, phase = %ActionPhase::Succeeded, "docker build");
        Ok(Output {
            exit_code: 0,
            files: entries,
            directories: vec![task.dirs.mount_handle.clone()],
            detail: None,
            is_error: false,
            env: task.env.clone(),
        })
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
