// SPDX-License-Identifier: MIT

//! The terragrunt stack: run an infrastructure verb inside a module
//! directory.

use crate::cloud::CloudClient;
use crate::dirs::{self, DirKind};
use crate::dispatch::{ActionPhase, Output};
use crate::engine::{container_exec_path, Engine, CONTAINER_MOUNT_PATH};
use crate::error::ActionError;
use crate::task::TaskContext;
use std::path::Path;

pub const TERRAGRUNT_MANIFEST: &str = "terragrunt.hcl";

/// Commands accepted in a caller-supplied command list.
pub const ALLOWED_COMMANDS: [&str; 6] = ["run-all", "plan", "apply", "destroy", "show", "init"];

/// The terragrunt verbs bound to dispatchable tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Plan,
    Apply,
    Destroy,
    Validate,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Plan => "plan",
            Verb::Apply => "apply",
            Verb::Destroy => "destroy",
            Verb::Validate => "validate",
        }
    }

    /// Verbs that mutate infrastructure run unattended.
    fn auto_approve(&self) -> bool {
        matches!(self, Verb::Apply | Verb::Destroy)
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Run a terragrunt verb in a module directory under the working
/// directory.
#[derive(Debug)]
pub struct TerragruntAction {
    verb: Verb,
}

impl TerragruntAction {
    pub fn new(verb: Verb) -> Self {
        Self { verb }
    }

    pub async fn run<E: Engine, C: CloudClient>(
        &self,
        ctx: &TaskContext<'_, E, C>,
    ) -> Result<Output, ActionError> {
        let task = ctx.task;
        let params = ctx.params;

        let module = params.target_module.as_deref().unwrap_or(".").trim();
        let module_path = resolve_module(module, ctx)?;
        validate_custom_commands(&params.terragrunt_commands)?;
        tracing::debug!(
            task = %task.name,
            phase = %ActionPhase::Configured,
            verb = %self.verb,
            module = %module_path.display(),
            "terragrunt"
        );

        let module_handle = ctx.engine.host_directory(&module_path).await?;
        let entries = ctx.engine.directory_entries(&module_handle).await?;
        if !entries.iter().any(|e| e == TERRAGRUNT_MANIFEST) {
            return Err(ActionError::Configuration(format!(
                "required file {TERRAGRUNT_MANIFEST} not found in {}",
                module_path.display()
            )));
        }
        tracing::debug!(task = %task.name, phase = %ActionPhase::DirectoryVerified, "terragrunt");

        // The whole working directory mounts; execution happens in the
        // module.
        let mounted = ctx
            .engine
            .mount(
                &ctx.container,
                &task.dirs.work_handle,
                CONTAINER_MOUNT_PATH,
                &container_exec_path(module),
            )
            .await?;
        let mounted = ctx.with_task_env(mounted).await?;
        tracing::debug!(task = %task.name, phase = %ActionPhase::Mounted, "terragrunt");

        tracing::debug!(task = %task.name, phase = %ActionPhase::Executing, "terragrunt");
        let commands = self.commands(&params.terragrunt_commands);
        ctx.run_commands(mounted, &commands, false).await?;

        tracing::info!(task = %task.name, phase = %ActionPhase::Succeeded, "terragrunt");
        Ok(Output {
            exit_code: 0,
            files: entries,
            directories: vec![task.dirs.work_handle.clone()],
            detail: None,
            is_error: false,
            env: task.env.clone(),
        })
    }

    /// The command sequence: a manifest sanity read, then either the
    /// caller's command list or the verb itself.
    fn commands(&self, custom: &[String]) -> Vec<Vec<String>> {
        let mut commands = vec![vec![
            "cat".to_string(),
            TERRAGRUNT_MANIFEST.to_string(),
        ]];
        if custom.is_empty() {
            commands.push(terragrunt_argv(self.verb.as_str(), self.verb.auto_approve()));
        } else {
            for verb in custom {
                let auto = verb == "apply" || verb == "destroy";
                commands.push(terragrunt_argv(verb, auto));
            }
        }
        commands
    }
}

fn terragrunt_argv(verb: &str, auto_approve: bool) -> Vec<String> {
    let mut argv = vec!["terragrunt".to_string(), verb.to_string()];
    if auto_approve {
        argv.push("-auto-approve".to_string());
    }
    argv
}

/// The module must be a relative path under the working directory and
/// live inside a git repository.
fn resolve_module<E: Engine, C: CloudClient>(
    module: &str,
    ctx: &TaskContext<'_, E, C>,
) -> Result<std::path::PathBuf, ActionError> {
    if Path::new(module).is_absolute() {
        return Err(ActionError::Configuration(format!(
            "target module {module} must be relative to the working directory"
        )));
    }
    let resolved = dirs::resolve_under(module, &ctx.task.dirs.work, DirKind::Target)
        .map_err(|e| ActionError::Configuration(e.to_string()))?;
    if !dirs::in_git_repository(&resolved.path) {
        return Err(ActionError::Configuration(format!(
            "target module {} is not inside a git repository",
            resolved.path.display()
        )));
    }
    Ok(resolved.path)
}

fn validate_custom_commands(commands: &[String]) -> Result<(), ActionError> {
    for command in commands {
        if !ALLOWED_COMMANDS.contains(&command.as_str()) {
            return Err(ActionError::Configuration(format!(
                "terragrunt command {command:?} is not allowed (allowed: {})",
                ALLOWED_COMMANDS.join("|")
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "terragrunt_tests.rs"]
mod tests;
