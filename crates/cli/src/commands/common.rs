// SPDX-License-Identifier: MIT

//! Flags and execution flow shared by every stack command.

use anyhow::Result;
use clap::Args;
use gantry_adapters::DockerCliEngine;
use gantry_core::cloud::CloudClient;
use gantry_core::dispatch::{self, ActionParams, Output, Stack};
use gantry_core::env::EnvSnapshot;
use gantry_core::id::UuidIdGen;
use gantry_core::job::{Job, JobSpec};
use gantry_core::pipeline::{PipelineArgs, PipelineContext};
use gantry_core::task::{CommandSet, Task, TaskContext};
use std::path::PathBuf;

/// Pipeline flags carried by every stack command.
#[derive(Args, Clone, Default)]
pub struct PipelineFlags {
    /// Working directory (defaults to the current directory)
    #[arg(long, default_value = "")]
    pub work_dir: String,

    /// Directory to mount into the container (defaults to the working directory)
    #[arg(long, default_value = "")]
    pub mount_dir: String,

    /// Directory to execute in (defaults to the mount directory)
    #[arg(long, default_value = "")]
    pub target_dir: String,

    /// Exported variables to scan into the environment
    #[arg(long = "scan-env", value_name = "KEY")]
    pub scan_env: Vec<String>,

    /// Explicit variables to set
    #[arg(long = "set-env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub set_env: Vec<(String, String)>,

    /// Dotenv file to scan
    #[arg(long, value_name = "FILE")]
    pub dotenv_file: Option<PathBuf>,

    /// Variable-name prefixes to scan
    #[arg(long = "scan-prefix", value_name = "PREFIX")]
    pub scan_prefixes: Vec<String>,

    /// Scan AWS credential variables
    #[arg(long)]
    pub scan_aws_env: bool,

    /// Scan TF_VAR_-prefixed variables
    #[arg(long)]
    pub scan_terraform_env: bool,

    /// Scan the entire host environment
    #[arg(long)]
    pub scan_host_env: bool,

    /// Custom command to run instead of the task default (repeatable)
    #[arg(long = "command", value_name = "COMMAND")]
    pub commands: Vec<String>,

    /// Container image override
    #[arg(long)]
    pub image: Option<String>,

    /// Container image version
    #[arg(long)]
    pub image_version: Option<String>,
}

impl PipelineFlags {
    pub fn to_pipeline_args(&self, task_name: &str) -> PipelineArgs {
        PipelineArgs {
            work_dir: self.work_dir.clone(),
            mount_dir: self.mount_dir.clone(),
            target_dir: self.target_dir.clone(),
            task_name: task_name.to_string(),
            env_keys_to_scan: self.scan_env.clone(),
            env_pairs_to_set: self.set_env.iter().cloned().collect(),
            dotenv_file: self.dotenv_file.clone(),
            scan_prefixes: self.scan_prefixes.clone(),
            scan_aws: self.scan_aws_env,
            scan_terraform: self.scan_terraform_env,
            scan_host: self.scan_host_env,
        }
    }

    fn command_set(&self) -> CommandSet {
        CommandSet {
            default: Vec::new(),
            custom: self
                .commands
                .iter()
                .map(|c| c.split_whitespace().map(str::to_string).collect())
                .collect(),
        }
    }
}

pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid key=value: no `=` found in `{s}`"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Whether the process runs under vendor CI automation that handles
/// registry authentication itself.
pub fn vendor_automation(env: &EnvSnapshot) -> bool {
    env.get("GITHUB_ACTIONS").is_some_and(|v| v == "true")
        || env.get("CI").is_some_and(|v| v == "true")
}

/// The shared pipeline → job → task → dispatch flow.
pub async fn execute<C: CloudClient>(
    stack: Stack,
    task_name: &str,
    flags: &PipelineFlags,
    params: ActionParams,
    cloud: C,
    env: EnvSnapshot,
) -> Result<Output> {
    let ctx = PipelineContext::new(flags.to_pipeline_args(task_name), env)?;

    let engine = DockerCliEngine::new();
    let ids = UuidIdGen;
    let mut spec = JobSpec::new(format!("{stack}:{}", ctx.options.task_name), stack);
    spec.image = flags.image.clone().unwrap_or_default();
    spec.image_version = flags.image_version.clone().unwrap_or_default();

    let job = Job::new(&ctx, spec, engine, &ids).await?;
    let task = Task::for_job(&job, flags.command_set(), &ids);
    let task_ctx = TaskContext {
        task: &task,
        engine: &job.engine,
        cloud: &cloud,
        params: &params,
        container: job.container,
    };

    let output = dispatch::dispatch(&task_ctx).await?;
    report(&output);
    Ok(output)
}

fn report(output: &Output) {
    if let Some(detail) = &output.detail {
        println!("{detail}");
    }
    tracing::info!(exit_code = output.exit_code, "task finished");
}
