// SPDX-License-Identifier: MIT

//! Job construction.
//!
//! A Job binds a validated PipelineContext to a live engine: it checks
//! the engine connection, materializes the default container image for
//! the stack, performs the enabled environment scans for real, and
//! obtains directory handles. Every step can fail individually and
//! aborts construction, wrapped with the job's name and id.

use crate::dirs::ResolvedDir;
use crate::dispatch::Stack;
use crate::engine::{self, ContainerHandle, DirectoryHandle, Engine, EngineError};
use crate::env::{self, EnvScanError, JobEnv};
use crate::error::JobError;
use crate::id::IdGen;
use crate::pipeline::{PipelineContext, PipelineOptions};

/// Per-job inputs beyond the pipeline configuration.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub name: String,
    pub stack: Stack,
    /// Container image override; empty means the stack default.
    pub image: String,
    /// Image version; empty means `latest`.
    pub image_version: String,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, stack: Stack) -> Self {
        Self {
            name: name.into(),
            stack,
            image: String::new(),
            image_version: String::new(),
        }
    }
}

/// The directory triple plus the invocation root, with engine handles.
#[derive(Debug, Clone)]
pub struct JobDirs {
    pub root: ResolvedDir,
    pub work: ResolvedDir,
    pub mount: ResolvedDir,
    pub target: ResolvedDir,
    pub root_handle: DirectoryHandle,
    pub work_handle: DirectoryHandle,
    pub mount_handle: DirectoryHandle,
    /// Actions mount and verify against the mount directory; the target
    /// handle reuses it so a stale target path cannot desynchronize the
    /// two.
    pub target_handle: DirectoryHandle,
    /// In-container working directory, under the mount root.
    pub exec_path: String,
}

/// A pipeline invocation bound to a live engine.
#[derive(Debug, Clone)]
pub struct Job<E: Engine> {
    pub name: String,
    pub id: String,
    pub stack: Stack,
    /// Normalized image the default container was built from.
    pub image: String,
    pub engine: E,
    pub options: PipelineOptions,
    pub env: JobEnv,
    pub dirs: JobDirs,
    /// Default container built from the stack image.
    pub container: ContainerHandle,
}

impl<E: Engine> Job<E> {
    /// Build a job from a validated pipeline context.
    pub async fn new(
        ctx: &PipelineContext,
        spec: JobSpec,
        engine: E,
        ids: &impl IdGen,
    ) -> Result<Self, JobError> {
        let id = ids.next();
        let name = spec.name.clone();
        let wrap_engine = |source: EngineError| JobError::Engine {
            name: name.clone(),
            id: id.clone(),
            source,
        };
        let wrap_env = |source: EnvScanError| JobError::Env {
            name: name.clone(),
            id: id.clone(),
            source,
        };

        engine.connect().await.map_err(&wrap_engine)?;

        let image_ref = if spec.image.trim().is_empty() {
            spec.stack.default_image()
        } else {
            spec.image.as_str()
        };
        let image =
            engine::normalize_image(image_ref, &spec.image_version).map_err(&wrap_engine)?;
        let container = engine.from_image(&image).await.map_err(&wrap_engine)?;

        let env = scan_env(ctx, wrap_env)?;

        let options = ctx.options.clone();
        let root_handle = engine
            .host_directory(&options.root_dir.path)
            .await
            .map_err(&wrap_engine)?;
        let work_handle = engine
            .host_directory(&options.work_dir.path)
            .await
            .map_err(&wrap_engine)?;
        let mount_handle = engine
            .host_directory(&options.mount_dir.path)
            .await
            .map_err(&wrap_engine)?;
        let target_handle = mount_handle.clone();
        let exec_path = exec_path_for(&options);

        tracing::info!(
            job = %name,
            id = %id,
            stack = %spec.stack,
            image = %image,
            "job constructed"
        );

        Ok(Self {
            name,
            id,
            stack: spec.stack,
            image,
            engine,
            dirs: JobDirs {
                root: options.root_dir.clone(),
                work: options.work_dir.clone(),
                mount: options.mount_dir.clone(),
                target: options.target_dir.clone(),
                root_handle,
                work_handle,
                mount_handle,
                target_handle,
                exec_path,
            },
            options,
            env,
            container,
        })
    }
}

/// Run the enabled scans for real. The pipeline already validated each
/// source, so failures here mean the environment changed between
/// validation and job construction.
fn scan_env(
    ctx: &PipelineContext,
    wrap: impl Fn(EnvScanError) -> JobError,
) -> Result<JobEnv, JobError> {
    let options = &ctx.options;
    let mut job_env = JobEnv::default();

    if options.scan_aws {
        job_env.aws = ctx.env.scan_aws_credentials().map_err(&wrap)?;
    }
    if options.scan_terraform {
        job_env.terraform = ctx.env.scan_terraform().map_err(&wrap)?;
    }
    if !options.env_keys_to_scan.is_empty() {
        job_env.custom = ctx.env.scan_keys(&options.env_keys_to_scan, &[]).map_err(&wrap)?;
    }
    if let Some(dotenv) = &options.dotenv_file {
        job_env.dotenv = env::scan_dotenv(dotenv).map_err(&wrap)?;
    }
    if options.scan_prefix_list() {
        job_env.prefix = ctx.env.scan_prefixes(&options.scan_prefixes).map_err(&wrap)?;
    }
    env::validate_pairs(&options.env_pairs_to_set).map_err(&wrap)?;
    job_env.explicit = options.env_pairs_to_set.clone();
    // The full host capture runs last; it cannot fail.
    if options.scan_host {
        job_env.host = ctx.env.all();
    }

    Ok(job_env)
}

/// The in-container working directory: the target's path relative to
/// the mount directory, placed under the mount root.
fn exec_path_for(options: &PipelineOptions) -> String {
    let rel = options
        .target_dir
        .path
        .strip_prefix(&options.mount_dir.path)
        .unwrap_or(std::path::Path::new(""));
    engine::container_exec_path(&rel.to_string_lossy())
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
