// SPDX-License-Identifier: MIT

//! gantry - pipeline execution orchestrator

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{aws, docker, infra};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gantry", version, about = "Pipeline execution orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Docker stack tasks
    Docker(docker::DockerArgs),
    /// AWS stack tasks
    Aws(aws::AwsArgs),
    /// Infrastructure stack tasks
    Infra(infra::InfraArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Docker(args) => docker::docker(args).await,
        Commands::Aws(args) => aws::aws(args).await,
        Commands::Infra(args) => infra::infra(args).await,
    }
}
