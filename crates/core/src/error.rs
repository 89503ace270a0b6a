// SPDX-License-Identifier: MIT

//! Cross-cutting error taxonomy.
//!
//! Per-concern errors (`DirError`, `EnvScanError`, `EngineError`,
//! `CloudError`) live next to their modules; this module defines the
//! wrapping layers: pipeline configuration, job construction, action
//! configuration/execution, and dispatch. Every wrap preserves the
//! original cause.

use crate::cloud::CloudError;
use crate::dirs::DirError;
use crate::dispatch::Stack;
use crate::engine::EngineError;
use crate::env::EnvScanError;
use thiserror::Error;

/// Fatal configuration problems detected while building a
/// PipelineContext.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pipeline configuration: {0}")]
    Directory(#[from] DirError),
    #[error("pipeline configuration: invalid task name {0:?}")]
    InvalidTaskName(String),
    #[error("pipeline configuration: keys requested for scanning are not exported: {keys:?}")]
    MissingExportedKeys {
        keys: Vec<String>,
        #[source]
        source: EnvScanError,
    },
    #[error("pipeline configuration: {0}")]
    Env(#[from] EnvScanError),
    #[error("pipeline configuration: could not determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// A failure during Job construction, carrying the job identity.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job {name} ({id}): engine: {source}")]
    Engine {
        name: String,
        id: String,
        #[source]
        source: EngineError,
    },
    #[error("job {name} ({id}): environment: {source}")]
    Env {
        name: String,
        id: String,
        #[source]
        source: EnvScanError,
    },
}

/// A failure inside a stack action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A required option is missing or invalid, or a prerequisite file
    /// is absent from the directory to mount.
    #[error("action configuration: {0}")]
    Configuration(String),
    #[error("action execution: {0}")]
    Engine(#[from] EngineError),
    #[error("action execution: {0}")]
    Cloud(#[from] CloudError),
    #[error("action execution: command {argv:?} exited with code {code}")]
    CommandFailed { argv: Vec<String>, code: i64 },
}

/// A failure surfaced by the dispatch layer.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No action is bound for this (stack, task) pair. The source
    /// system silently succeeded here; that is treated as a bug.
    #[error("no action bound for task {task:?} on stack {stack}")]
    UnknownTask { stack: Stack, task: String },
    #[error(transparent)]
    Action(#[from] ActionError),
}
