// SPDX-License-Identifier: MIT

//! `gantry infra terragrunt run` - run a terragrunt verb in a module

use super::common::{execute, PipelineFlags};
use anyhow::Result;
use clap::{Args, Subcommand};
use gantry_adapters::NoOpCloudClient;
use gantry_core::dispatch::{ActionParams, Stack};
use gantry_core::env::EnvSnapshot;

#[derive(Args)]
pub struct InfraArgs {
    #[command(subcommand)]
    command: InfraCommand,
}

#[derive(Subcommand)]
enum InfraCommand {
    /// Terragrunt tasks
    Terragrunt(TerragruntArgs),
}

#[derive(Args)]
struct TerragruntArgs {
    #[command(subcommand)]
    command: TerragruntCommand,
}

#[derive(Subcommand)]
enum TerragruntCommand {
    /// Run a terragrunt task in the target module
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    pipeline: PipelineFlags,

    /// Task to run: plan, apply, destroy or validate
    #[arg(long)]
    task: String,

    /// Module directory, relative to the working directory
    #[arg(long)]
    target_module: Option<String>,

    /// Terragrunt commands to run instead of the task verb (repeatable)
    #[arg(long = "terragrunt-command", value_name = "COMMAND")]
    terragrunt_commands: Vec<String>,
}

pub async fn infra(args: InfraArgs) -> Result<()> {
    match args.command {
        InfraCommand::Terragrunt(tg) => match tg.command {
            TerragruntCommand::Run(run) => {
                let params = ActionParams {
                    target_module: run.target_module.clone(),
                    terragrunt_commands: run.terragrunt_commands.clone(),
                    ..Default::default()
                };
                execute(
                    Stack::Terragrunt,
                    &run.task,
                    &run.pipeline,
                    params,
                    NoOpCloudClient::new(),
                    EnvSnapshot::from_process(),
                )
                .await?;
                Ok(())
            }
        },
    }
}
