// SPDX-License-Identifier: MIT

//! `gantry docker build` - build an image from the target directory

use super::common::{execute, PipelineFlags};
use anyhow::Result;
use clap::{Args, Subcommand};
use gantry_adapters::NoOpCloudClient;
use gantry_core::dispatch::{ActionParams, Stack};
use gantry_core::env::EnvSnapshot;

#[derive(Args)]
pub struct DockerArgs {
    #[command(subcommand)]
    command: DockerCommand,
}

#[derive(Subcommand)]
enum DockerCommand {
    /// Build the image described by the Dockerfile in the target directory
    Build(BuildArgs),
}

#[derive(Args)]
struct BuildArgs {
    #[command(flatten)]
    pipeline: PipelineFlags,
}

pub async fn docker(args: DockerArgs) -> Result<()> {
    match args.command {
        DockerCommand::Build(build) => {
            execute(
                Stack::Docker,
                "build",
                &build.pipeline,
                ActionParams::default(),
                NoOpCloudClient::new(),
                EnvSnapshot::from_process(),
            )
            .await?;
            Ok(())
        }
    }
}
