// SPDX-License-Identifier: MIT

//! Task construction and the context actions execute against.
//!
//! Unlike Job construction, making a Task cannot fail: it only derives
//! values from an already-valid Job. The merged environment view is
//! computed exactly once here; actions never re-merge layers.

use crate::cloud::CloudClient;
use crate::dispatch::{ActionParams, Stack};
use crate::engine::{ContainerHandle, Engine, ExecResult, CONTAINER_MOUNT_PATH};
use crate::env::{EnvMap, JobEnv};
use crate::error::ActionError;
use crate::id::{random_name, IdGen};
use crate::job::{Job, JobDirs};

/// Default and caller-supplied command lists; a non-empty custom list
/// replaces the default wholesale.
#[derive(Debug, Clone, Default)]
pub struct CommandSet {
    pub default: Vec<Vec<String>>,
    pub custom: Vec<Vec<String>>,
}

impl CommandSet {
    pub fn with_default(default: Vec<Vec<String>>) -> Self {
        Self {
            default,
            custom: Vec::new(),
        }
    }

    pub fn effective(&self) -> &[Vec<String>] {
        if self.custom.is_empty() {
            &self.default
        } else {
            &self.custom
        }
    }
}

/// One dispatchable unit of work within a Job.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub id: String,
    pub stack: Stack,
    /// Default container name, `rand-cont-` plus a random suffix.
    pub container_name: String,
    /// Merged environment view, computed once.
    pub env: EnvMap,
    /// The per-source layers, for actions that address one source.
    pub layers: JobEnv,
    pub dirs: JobDirs,
    pub commands: CommandSet,
}

impl Task {
    pub fn new(
        stack: Stack,
        name: impl Into<String>,
        env: &JobEnv,
        dirs: &JobDirs,
        commands: CommandSet,
        ids: &impl IdGen,
    ) -> Self {
        Self {
            name: name.into(),
            id: ids.next(),
            stack,
            container_name: random_name("rand-cont-", 5),
            env: env.merged(),
            layers: env.clone(),
            dirs: dirs.clone(),
            commands,
        }
    }

    pub fn for_job<E: Engine>(job: &Job<E>, commands: CommandSet, ids: &impl IdGen) -> Self {
        Self::new(
            job.stack,
            job.options.task_name.clone(),
            &job.env,
            &job.dirs,
            commands,
            ids,
        )
    }
}

/// Everything an action needs: the task, the capability surfaces, the
/// caller's stack options, and the container to run in.
pub struct TaskContext<'a, E: Engine, C: CloudClient> {
    pub task: &'a Task,
    pub engine: &'a E,
    pub cloud: &'a C,
    pub params: &'a ActionParams,
    pub container: ContainerHandle,
}

impl<'a, E: Engine, C: CloudClient> TaskContext<'a, E, C> {
    /// List the mount directory and check that every required file is
    /// present. Returns the full listing.
    pub async fn verify_entries(&self, required: &[&str]) -> Result<Vec<String>, ActionError> {
        let entries = self
            .engine
            .directory_entries(&self.task.dirs.mount_handle)
            .await?;
        for file in required {
            if !entries.iter().any(|e| e == file) {
                return Err(ActionError::Configuration(format!(
                    "required file {file} not found in {}",
                    self.task.dirs.mount.path.display()
                )));
            }
        }
        Ok(entries)
    }

    /// Mount the task's directory at the container mount root and set
    /// the working directory to the task's exec path.
    pub async fn mount(&self) -> Result<ContainerHandle, ActionError> {
        let container = self
            .engine
            .mount(
                &self.container,
                &self.task.dirs.mount_handle,
                CONTAINER_MOUNT_PATH,
                &self.task.dirs.exec_path,
            )
            .await?;
        Ok(container)
    }

    /// Apply the task's merged environment to a container.
    pub async fn with_task_env(
        &self,
        container: ContainerHandle,
    ) -> Result<ContainerHandle, ActionError> {
        self.with_env_map(container, &self.task.env).await
    }

    /// Apply an arbitrary environment map to a container.
    pub async fn with_env_map(
        &self,
        mut container: ContainerHandle,
        env: &EnvMap,
    ) -> Result<ContainerHandle, ActionError> {
        for (key, value) in env {
            container = self.engine.with_env(&container, key, value).await?;
        }
        Ok(container)
    }

    /// Run each command in order; a non-zero exit code fails the whole
    /// sequence.
    pub async fn run_commands(
        &self,
        container: ContainerHandle,
        commands: &[Vec<String>],
        capture_stdout: bool,
    ) -> Result<Vec<ExecResult>, ActionError> {
        let mut results = Vec::with_capacity(commands.len());
        for argv in commands {
            tracing::debug!(task = %self.task.name, command = ?argv, "executing command");
            let result = self.engine.exec(&container, argv, capture_stdout).await?;
            if result.exit_code != 0 {
                return Err(ActionError::CommandFailed {
                    argv: argv.clone(),
                    code: result.exit_code,
                });
            }
            results.push(result);
        }
        Ok(results)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
