// SPDX-License-Identifier: MIT

//! Top-level pipeline configuration.
//!
//! `PipelineContext::new` takes the flat argument bag produced by the
//! CLI layer plus an environment snapshot, validates everything
//! fail-fast in a fixed order, and produces the immutable options every
//! later layer reads. Scans that only exist for validation here are
//! discarded and re-run at Job construction.

use crate::dirs::{self, DirKind, ResolvedDir};
use crate::env::{self, EnvMap, EnvSnapshot};
use crate::error::ConfigError;
use std::path::PathBuf;

/// The flat argument bag from the CLI/config layer.
#[derive(Debug, Clone, Default)]
pub struct PipelineArgs {
    pub work_dir: String,
    pub mount_dir: String,
    pub target_dir: String,
    pub task_name: String,

    /// Keys that must already be exported; scanned into the custom layer.
    pub env_keys_to_scan: Vec<String>,
    /// Explicit key-value pairs to set.
    pub env_pairs_to_set: EnvMap,
    /// Dotenv file to scan; enables the dotenv layer when set.
    pub dotenv_file: Option<PathBuf>,
    /// Prefixes to scan; enables the prefix layer when non-empty.
    pub scan_prefixes: Vec<String>,

    pub scan_aws: bool,
    pub scan_terraform: bool,
    pub scan_host: bool,
}

/// Validated configuration for one invocation. Immutable after
/// construction.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// The invocation root, always the current directory.
    pub root_dir: ResolvedDir,
    pub work_dir: ResolvedDir,
    pub mount_dir: ResolvedDir,
    pub target_dir: ResolvedDir,
    /// Uppercased, trimmed task name.
    pub task_name: String,

    pub env_keys_to_scan: Vec<String>,
    pub env_pairs_to_set: EnvMap,
    pub dotenv_file: Option<PathBuf>,
    pub scan_prefixes: Vec<String>,

    pub scan_aws: bool,
    pub scan_terraform: bool,
    pub scan_host: bool,
}

impl PipelineOptions {
    pub fn scan_dotenv(&self) -> bool {
        self.dotenv_file.is_some()
    }

    pub fn scan_prefix_list(&self) -> bool {
        !self.scan_prefixes.is_empty()
    }
}

/// Validated pipeline configuration plus the environment snapshot all
/// scans read from.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub options: PipelineOptions,
    pub env: EnvSnapshot,
}

impl PipelineContext {
    /// Validate the argument bag and build the context. First error
    /// wins; nothing is retried.
    pub fn new(args: PipelineArgs, env: EnvSnapshot) -> Result<Self, ConfigError> {
        // 1-3. Resolve the directory triple, each defaulting to its
        // parent and each contained in it.
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        let root_dir = dirs::resolve("", &cwd, DirKind::Root)?;
        let work_dir = dirs::resolve(&args.work_dir, &cwd, DirKind::Work)?;
        let mount_dir = dirs::resolve_under(&args.mount_dir, &work_dir, DirKind::Mount)?;
        let target_dir = dirs::resolve_under(&args.target_dir, &mount_dir, DirKind::Target)?;

        // 4. Task name must survive normalization.
        let task_name = normalize_task_name(&args.task_name);
        if task_name.is_empty() {
            return Err(ConfigError::InvalidTaskName(args.task_name));
        }

        // 5. Keys the caller promised to export must actually be set.
        if !args.env_keys_to_scan.is_empty() {
            env.require_set(&args.env_keys_to_scan)
                .map_err(|source| ConfigError::MissingExportedKeys {
                    keys: args.env_keys_to_scan.clone(),
                    source,
                })?;
        }

        // 6. Explicit pairs must be structurally sound.
        env::validate_pairs(&args.env_pairs_to_set)?;

        // 7-10. Validate enabled scan sources now; results are
        // discarded and re-scanned at Job construction.
        if args.scan_aws {
            env.scan_aws_credentials()?;
        }
        if args.scan_terraform {
            env.scan_terraform()?;
        }
        if let Some(dotenv) = &args.dotenv_file {
            env::scan_dotenv(dotenv)?;
        }
        if !args.scan_prefixes.is_empty() {
            env.scan_prefixes(&args.scan_prefixes)?;
        }

        tracing::debug!(
            task = %task_name,
            work = %work_dir.path.display(),
            mount = %mount_dir.path.display(),
            target = %target_dir.path.display(),
            "pipeline configuration validated"
        );

        Ok(Self {
            options: PipelineOptions {
                root_dir,
                work_dir,
                mount_dir,
                target_dir,
                task_name,
                env_keys_to_scan: args.env_keys_to_scan,
                env_pairs_to_set: args.env_pairs_to_set,
                dotenv_file: args.dotenv_file,
                scan_prefixes: args.scan_prefixes,
                scan_aws: args.scan_aws,
                scan_terraform: args.scan_terraform,
                scan_host: args.scan_host,
            },
            env,
        })
    }
}

/// Task names are compared uppercase and trimmed.
pub fn normalize_task_name(name: &str) -> String {
    name.trim().to_uppercase()
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
