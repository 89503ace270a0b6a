// SPDX-License-Identifier: MIT

//! `gantry aws ecr push` and `gantry aws ecs deploy`

use super::common::{execute, vendor_automation, PipelineFlags};
use anyhow::Result;
use clap::{Args, Subcommand};
use gantry_adapters::AwsCliClient;
use gantry_core::dispatch::{ActionParams, Stack};
use gantry_core::env::EnvSnapshot;

#[derive(Args)]
pub struct AwsArgs {
    #[command(subcommand)]
    command: AwsCommand,
}

#[derive(Subcommand)]
enum AwsCommand {
    /// Container registry tasks
    Ecr(EcrArgs),
    /// Container service tasks
    Ecs(EcsArgs),
}

#[derive(Args)]
struct EcrArgs {
    #[command(subcommand)]
    command: EcrCommand,
}

#[derive(Subcommand)]
enum EcrCommand {
    /// Build the image and push it to the registry
    Push(PushArgs),
}

#[derive(Args)]
struct PushArgs {
    #[command(flatten)]
    pipeline: PipelineFlags,

    /// Registry host, e.g. 123.dkr.ecr.eu-west-1.amazonaws.com
    #[arg(long)]
    registry: String,

    /// Repository within the registry
    #[arg(long)]
    repository: String,

    /// Image tag
    #[arg(long)]
    tag: Option<String>,

    /// Generate a random tag instead of using --tag
    #[arg(long)]
    generate_random_tag: bool,
}

#[derive(Args)]
struct EcsArgs {
    #[command(subcommand)]
    command: EcsCommand,
}

#[derive(Subcommand)]
enum EcsCommand {
    /// Register a task definition with a new image and roll the service
    Deploy(DeployArgs),
}

#[derive(Args)]
struct DeployArgs {
    #[command(flatten)]
    pipeline: PipelineFlags,

    /// Cluster the service runs in
    #[arg(long)]
    cluster: String,

    /// Service to update
    #[arg(long)]
    service: String,

    /// Task definition family to rewrite
    #[arg(long)]
    task_definition: String,

    /// Image URL for the rewritten containers
    #[arg(long)]
    image: String,

    /// Image version appended when the URL carries no tag
    #[arg(long)]
    version: Option<String>,

    /// Force a new deployment even if nothing changed
    #[arg(long)]
    force_new_deployment: bool,
}

pub async fn aws(args: AwsArgs) -> Result<()> {
    match args.command {
        AwsCommand::Ecr(ecr) => match ecr.command {
            EcrCommand::Push(push) => run_push(push).await,
        },
        AwsCommand::Ecs(ecs) => match ecs.command {
            EcsCommand::Deploy(deploy) => run_deploy(deploy).await,
        },
    }
}

async fn run_push(args: PushArgs) -> Result<()> {
    let env = EnvSnapshot::from_process();
    let cloud = AwsCliClient::from_env_layer(&env.scan_aws_credentials()?)?;

    let mut flags = args.pipeline;
    flags.scan_aws_env = true;
    let params = ActionParams {
        registry: Some(args.registry),
        repository: Some(args.repository),
        tag: args.tag,
        generate_random_tag: args.generate_random_tag,
        vendor_automation: vendor_automation(&env),
        ..Default::default()
    };

    execute(Stack::AwsEcr, "push", &flags, params, cloud, env).await?;
    Ok(())
}

async fn run_deploy(args: DeployArgs) -> Result<()> {
    let env = EnvSnapshot::from_process();
    let cloud = AwsCliClient::from_env_layer(&env.scan_aws_credentials()?)?;

    let mut flags = args.pipeline;
    flags.scan_aws_env = true;
    let params = ActionParams {
        cluster: Some(args.cluster),
        service: Some(args.service),
        task_definition: Some(args.task_definition),
        image: Some(args.image),
        version: args.version,
        force_new_deployment: args.force_new_deployment,
        ..Default::default()
    };

    execute(Stack::AwsEcs, "deploy", &flags, params, cloud, env).await?;
    Ok(())
}
