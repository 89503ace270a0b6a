// SPDX-License-Identifier: MIT

//! Stack definitions and the (stack, task) → action dispatch table.

use crate::cloud::CloudClient;
use crate::engine::{DirectoryHandle, Engine};
use crate::env::EnvMap;
use crate::error::DispatchError;
use crate::pipeline::normalize_task_name;
use crate::stacks;
use crate::task::TaskContext;

/// A named execution domain with its own capability implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stack {
    Docker,
    AwsEcr,
    AwsEcs,
    Terragrunt,
}

impl Stack {
    /// Default container image used when the caller does not override it.
    pub fn default_image(&self) -> &'static str {
        match self {
            Stack::Docker => "docker:23.0.1-dind",
            Stack::AwsEcr => "alpine:latest",
            Stack::AwsEcs => "alpine:latest",
            Stack::Terragrunt => "alpine/terragrunt:latest",
        }
    }
}

impl std::fmt::Display for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Stack::Docker => "DOCKER",
            Stack::AwsEcr => "AWS:ECR",
            Stack::AwsEcs => "AWS:ECS",
            Stack::Terragrunt => "INFRA:TERRAGRUNT",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for Stack {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DOCKER" => Ok(Stack::Docker),
            "AWS:ECR" => Ok(Stack::AwsEcr),
            "AWS:ECS" => Ok(Stack::AwsEcs),
            "INFRA:TERRAGRUNT" => Ok(Stack::Terragrunt),
            other => Err(format!("unknown stack: {other}")),
        }
    }
}

/// The concrete handler bound to one (stack, task) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    DockerBuild,
    EcrPush,
    EcsDeploy,
    TerragruntPlan,
    TerragruntApply,
    TerragruntDestroy,
    TerragruntValidate,
}

/// Pure lookup: (stack, normalized task name) → action. An unmatched
/// pair is an error, never a silent no-op.
pub fn lookup(stack: Stack, task_name: &str) -> Result<ActionKind, DispatchError> {
    let task = normalize_task_name(task_name);
    let action = match (stack, task.as_str()) {
        (Stack::Docker, "BUILD") => ActionKind::DockerBuild,
        (Stack::AwsEcr, "PUSH") => ActionKind::EcrPush,
        (Stack::AwsEcs, "DEPLOY") => ActionKind::EcsDeploy,
        (Stack::Terragrunt, "PLAN") => ActionKind::TerragruntPlan,
        (Stack::Terragrunt, "APPLY") => ActionKind::TerragruntApply,
        (Stack::Terragrunt, "DESTROY") => ActionKind::TerragruntDestroy,
        (Stack::Terragrunt, "VALIDATE") => ActionKind::TerragruntValidate,
        _ => return Err(DispatchError::UnknownTask { stack, task }),
    };
    Ok(action)
}

/// Stack-specific options, filled by the CLI layer and passed through
/// dispatch instead of being read from ambient global configuration.
#[derive(Debug, Clone, Default)]
pub struct ActionParams {
    // Registry push
    pub registry: Option<String>,
    pub repository: Option<String>,
    pub tag: Option<String>,
    pub generate_random_tag: bool,
    /// Running under vendor automation (CI) that performs registry
    /// login itself; skips host-side login when set.
    pub vendor_automation: bool,

    // Service deploy
    pub cluster: Option<String>,
    pub service: Option<String>,
    pub task_definition: Option<String>,
    pub image: Option<String>,
    pub version: Option<String>,
    pub force_new_deployment: bool,

    // Infrastructure
    pub target_module: Option<String>,
    pub terragrunt_commands: Vec<String>,
}

/// Result of one action invocation.
#[derive(Debug, Clone, Default)]
pub struct Output {
    pub exit_code: i64,
    pub files: Vec<String>,
    pub directories: Vec<DirectoryHandle>,
    /// Opaque engine detail (e.g. a published image digest).
    pub detail: Option<String>,
    pub is_error: bool,
    /// The merged environment the action executed with, for reporting.
    pub env: EnvMap,
}

impl Output {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::default()
        }
    }
}

/// Progression of a single action invocation. Any failure is terminal;
/// there is no retry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    Configured,
    DirectoryVerified,
    Mounted,
    Executing,
    Succeeded,
    Failed,
}

impl std::fmt::Display for ActionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ActionPhase::Configured => "configured",
            ActionPhase::DirectoryVerified => "directory-verified",
            ActionPhase::Mounted => "mounted",
            ActionPhase::Executing => "executing",
            ActionPhase::Succeeded => "succeeded",
            ActionPhase::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

/// Select and run the action bound to the task's (stack, name) pair.
pub async fn dispatch<E: Engine, C: CloudClient>(
    ctx: &TaskContext<'_, E, C>,
) -> Result<Output, DispatchError> {
    let action = lookup(ctx.task.stack, &ctx.task.name)?;
    tracing::info!(
        stack = %ctx.task.stack,
        task = %ctx.task.name,
        action = ?action,
        "dispatching task"
    );

    let output = match action {
        ActionKind::DockerBuild => stacks::docker::BuildAction::new().run(ctx).await?,
        ActionKind::EcrPush => stacks::ecr::PushAction::new().run(ctx).await?,
        ActionKind::EcsDeploy => stacks::ecs::DeployAction::new().run(ctx).await?,
        ActionKind::TerragruntPlan => {
            stacks::terragrunt::TerragruntAction::new(stacks::terragrunt::Verb::Plan)
                .run(ctx)
                .await?
        }
        ActionKind::TerragruntApply => {
            stacks::terragrunt::TerragruntAction::new(stacks::terragrunt::Verb::Apply)
                .run(ctx)
                .await?
        }
        ActionKind::TerragruntDestroy => {
            stacks::terragrunt::TerragruntAction::new(stacks::terragrunt::Verb::Destroy)
                .run(ctx)
                .await?
        }
        ActionKind::TerragruntValidate => {
            stacks::terragrunt::TerragruntAction::new(stacks::terragrunt::Verb::Validate)
                .run(ctx)
                .await?
        }
    };

    Ok(output)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
