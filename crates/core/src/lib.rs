// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gantry-core: configuration resolution and dispatch for the gantry CLI
//!
//! This crate provides:
//! - Directory resolution with work/mount/target containment invariants
//! - Multi-source environment-variable scanning with an ordered merge
//! - Pipeline → Job → Task → Action context construction
//! - Capability traits for the container engine and cloud clients
//! - The (stack, task) dispatch table and the stack-specific actions

pub mod id;

pub mod cloud;
pub mod engine;
pub mod fakes;

// Context layers (order matters for dependencies)
pub mod dirs;
pub mod env;
pub mod error;
pub mod pipeline;
pub mod job;
pub mod task;
pub mod dispatch;
pub mod stacks;

// Re-exports
pub use dirs::{DirError, DirKind, ResolvedDir};
pub use dispatch::{dispatch, ActionParams, ActionPhase, Output, Stack};
pub use engine::{ContainerHandle, DirectoryHandle, Engine, EngineError, ExecResult};
pub use env::{EnvLayer, EnvMap, EnvScanError, EnvSnapshot, JobEnv};
pub use error::{ActionError, ConfigError, DispatchError, JobError};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use job::{Job, JobDirs, JobSpec};
pub use pipeline::{PipelineArgs, PipelineContext, PipelineOptions};
pub use task::{CommandSet, Task, TaskContext};

// Re-export cloud surface
pub use cloud::{
    AwsCredentials, CloudClient, CloudError, ContainerDefinition, RegistryAuth, ServiceUpdate,
    TaskDefinition,
};
