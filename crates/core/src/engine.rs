// SPDX-License-Identifier: MIT

//! Capability trait for the external container execution engine.
//!
//! The engine is an external collaborator: gantry only decides what to
//! run, where, and with which environment, then hands off through this
//! trait. Handles are opaque; adapters own the state behind them.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Everything mounts under this path inside the container.
pub const CONTAINER_MOUNT_PATH: &str = "/build";

/// Normalize an execution path to live under the container mount root.
pub fn container_exec_path(path: &str) -> String {
    if path.is_empty() || path == "." {
        return CONTAINER_MOUNT_PATH.to_string();
    }
    if path.starts_with(CONTAINER_MOUNT_PATH) {
        return path.to_string();
    }
    format!("{}/{}", CONTAINER_MOUNT_PATH, path.trim_start_matches('/'))
}

/// Opaque reference to a host directory as understood by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryHandle(pub String);

impl std::fmt::Display for DirectoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to a container configuration held by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerHandle(pub u64);

impl std::fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "container-{}", self.0)
    }
}

/// Result of running a command inside a container.
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub exit_code: i64,
    pub stdout: Option<String>,
}

/// Errors from the execution engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to connect to the execution engine: {0}")]
    Connect(String),
    #[error("image reference is empty")]
    EmptyImage,
    #[error("no default image registered for stack {0}")]
    UnsupportedStack(String),
    #[error("directory {0} is not usable by the engine: {1}")]
    DirectoryInvalid(String, String),
    #[error("directory {0} is empty")]
    EmptyDirectory(String),
    #[error("unknown container handle {0}")]
    UnknownContainer(ContainerHandle),
    #[error("command {argv:?} failed to run: {detail}")]
    Exec { argv: Vec<String>, detail: String },
    #[error("image build failed: {0}")]
    Build(String),
    #[error("image publish to {address} failed: {detail}")]
    Publish { address: String, detail: String },
    #[error("registry authentication against {address} failed: {detail}")]
    Auth { address: String, detail: String },
    #[error("engine call {op} timed out after {seconds}s")]
    Timeout { op: &'static str, seconds: u64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The execution-engine capability surface.
///
/// Containers are immutable values on the engine side: configuration
/// calls (`with_env`, `mount`, `with_registry_auth`, `build`) return a
/// new handle rather than mutating the input.
#[async_trait]
pub trait Engine: Clone + Send + Sync + 'static {
    /// Verify the engine is reachable.
    async fn connect(&self) -> Result<(), EngineError>;

    /// Obtain a handle for a host directory.
    async fn host_directory(&self, path: &Path) -> Result<DirectoryHandle, EngineError>;

    /// List the entries of a host directory.
    async fn directory_entries(&self, dir: &DirectoryHandle) -> Result<Vec<String>, EngineError>;

    /// Create a container from an image reference.
    async fn from_image(&self, image: &str) -> Result<ContainerHandle, EngineError>;

    /// Set an environment variable on a container.
    async fn with_env(
        &self,
        container: &ContainerHandle,
        key: &str,
        value: &str,
    ) -> Result<ContainerHandle, EngineError>;

    /// Mount a host directory into a container and set the working
    /// directory for subsequent commands.
    async fn mount(
        &self,
        container: &ContainerHandle,
        dir: &DirectoryHandle,
        mount_path: &str,
        exec_path: &str,
    ) -> Result<ContainerHandle, EngineError>;

    /// Run a command inside the container.
    async fn exec(
        &self,
        container: &ContainerHandle,
        argv: &[String],
        capture_stdout: bool,
    ) -> Result<ExecResult, EngineError>;

    /// Build an image from a directory containing a build manifest.
    async fn build(
        &self,
        container: &ContainerHandle,
        dir: &DirectoryHandle,
    ) -> Result<ContainerHandle, EngineError>;

    /// Push a built image to an address, returning its digest.
    async fn publish(
        &self,
        container: &ContainerHandle,
        address: &str,
    ) -> Result<String, EngineError>;

    /// Authenticate the container's image operations against a registry.
    async fn with_registry_auth(
        &self,
        container: &ContainerHandle,
        address: &str,
        username: &str,
        secret: &str,
    ) -> Result<ContainerHandle, EngineError>;
}

/// Split an `image[:version]` reference, defaulting the version to
/// `latest`, lowercasing both parts.
pub fn normalize_image(image: &str, version: &str) -> Result<String, EngineError> {
    let image = image.trim();
    if image.is_empty() {
        return Err(EngineError::EmptyImage);
    }
    if let Some((name, tag)) = image.split_once(':') {
        // A version embedded in the reference wins over the option.
        return Ok(format!("{}:{}", name.to_lowercase(), tag.to_lowercase()));
    }
    let version = if version.trim().is_empty() {
        "latest"
    } else {
        version.trim()
    };
    Ok(format!("{}:{}", image.to_lowercase(), version.to_lowercase()))
}
