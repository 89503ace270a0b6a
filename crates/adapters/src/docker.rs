// SPDX-License-Identifier: MIT

//! Docker CLI execution engine.
//!
//! Containers are immutable configurations held in adapter state; a
//! container only becomes a `docker run` at exec time. Build and
//! publish shell out to the local docker binary. Every external call
//! carries a timeout.

use async_trait::async_trait;
use gantry_core::engine::{ContainerHandle, DirectoryHandle, Engine, EngineError, ExecResult};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Immutable container configuration behind a handle.
#[derive(Debug, Clone, Default)]
struct ContainerSpec {
    image: String,
    env: Vec<(String, String)>,
    /// Host directory and in-container mount path.
    mount: Option<(String, String)>,
    workdir: Option<String>,
    /// Set once `build` has produced a local image tag.
    built_tag: Option<String>,
}

#[derive(Default)]
struct EngineState {
    next_handle: u64,
    containers: HashMap<u64, ContainerSpec>,
}

impl EngineState {
    fn insert(&mut self, spec: ContainerSpec) -> ContainerHandle {
        self.next_handle += 1;
        self.containers.insert(self.next_handle, spec);
        ContainerHandle(self.next_handle)
    }

    fn get(&self, handle: &ContainerHandle) -> Result<ContainerSpec, EngineError> {
        self.containers
            .get(&handle.0)
            .cloned()
            .ok_or(EngineError::UnknownContainer(*handle))
    }
}

/// Execution engine backed by the local docker binary.
#[derive(Clone, Default)]
pub struct DockerCliEngine {
    state: Arc<Mutex<EngineState>>,
}

impl DockerCliEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn spec(&self, handle: &ContainerHandle) -> Result<ContainerSpec, EngineError> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(handle)
    }

    fn store(&self, spec: ContainerSpec) -> ContainerHandle {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(spec)
    }
}

async fn run_docker(
    args: &[String],
    op: &'static str,
    timeout: Duration,
) -> Result<std::process::Output, EngineError> {
    tracing::debug!(?args, "docker invocation");
    let result = tokio::time::timeout(timeout, Command::new("docker").args(args).output()).await;
    match result {
        Ok(output) => Ok(output?),
        Err(_) => Err(EngineError::Timeout {
            op,
            seconds: timeout.as_secs(),
        }),
    }
}

/// Extract the image digest from `docker push` output.
fn digest_from_push_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .filter_map(|line| {
            line.split_whitespace()
                .find(|word| word.starts_with("sha256:"))
        })
        .last()
        .map(str::to_string)
}

#[async_trait]
impl Engine for DockerCliEngine {
    async fn connect(&self) -> Result<(), EngineError> {
        let args = vec![
            "version".to_string(),
            "--format".to_string(),
            "{{.Server.Version}}".to_string(),
        ];
        let output = run_docker(&args, "connect", CONNECT_TIMEOUT)
            .await
            .map_err(|e| EngineError::Connect(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Connect(stderr.trim().to_string()));
        }
        Ok(())
    }

    async fn host_directory(&self, path: &Path) -> Result<DirectoryHandle, EngineError> {
        let meta = std::fs::metadata(path).map_err(|e| {
            EngineError::DirectoryInvalid(path.display().to_string(), e.to_string())
        })?;
        if !meta.is_dir() {
            return Err(EngineError::DirectoryInvalid(
                path.display().to_string(),
                "not a directory".to_string(),
            ));
        }
        Ok(DirectoryHandle(path.to_string_lossy().into_owned()))
    }

    async fn directory_entries(&self, dir: &DirectoryHandle) -> Result<Vec<String>, EngineError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir.0)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        if names.is_empty() {
            return Err(EngineError::EmptyDirectory(dir.0.clone()));
        }
        Ok(names)
    }

    async fn from_image(&self, image: &str) -> Result<ContainerHandle, EngineError> {
        if image.trim().is_empty() {
            return Err(EngineError::EmptyImage);
        }
        Ok(self.store(ContainerSpec {
            image: image.trim().to_string(),
            ..ContainerSpec::default()
        }))
    }

    async fn with_env(
        &self,
        container: &ContainerHandle,
        key: &str,
        value: &str,
    ) -> Result<ContainerHandle, EngineError> {
        let mut spec = self.spec(container)?;
        spec.env.push((key.to_string(), value.to_string()));
        Ok(self.store(spec))
    }

    async fn mount(
        &self,
        container: &ContainerHandle,
        dir: &DirectoryHandle,
        mount_path: &str,
        exec_path: &str,
    ) -> Result<ContainerHandle, EngineError> {
        let mut spec = self.spec(container)?;
        spec.mount = Some((dir.0.clone(), mount_path.to_string()));
        spec.workdir = Some(exec_path.to_string());
        Ok(self.store(spec))
    }

    async fn exec(
        &self,
        container: &ContainerHandle,
        argv: &[String],
        capture_stdout: bool,
    ) -> Result<ExecResult, EngineError> {
        let spec = self.spec(container)?;
        let mut args = vec!["run".to_string(), "--rm".to_string()];
        for (key, value) in &spec.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        if let Some((host, mount_path)) = &spec.mount {
            args.push("-v".to_string());
            args.push(format!("{host}:{mount_path}"));
        }
        if let Some(workdir) = &spec.workdir {
            args.push("-w".to_string());
            args.push(workdir.clone());
        }
        args.push(spec.image.clone());
        args.extend(argv.iter().cloned());

        let output = run_docker(&args, "exec", COMMAND_TIMEOUT).await?;
        let exit_code = i64::from(output.status.code().unwrap_or(-1));
        let stdout = capture_stdout
            .then(|| String::from_utf8_lossy(&output.stdout).into_owned());
        Ok(ExecResult { exit_code, stdout })
    }

    async fn build(
        &self,
        container: &ContainerHandle,
        dir: &DirectoryHandle,
    ) -> Result<ContainerHandle, EngineError> {
        let mut spec = self.spec(container)?;
        let tag = format!("gantry-build-{}", container.0);
        let args = vec![
            "build".to_string(),
            "-t".to_string(),
            tag.clone(),
            dir.0.clone(),
        ];
        let output = run_docker(&args, "build", COMMAND_TIMEOUT).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Build(stderr.trim().to_string()));
        }
        spec.built_tag = Some(tag);
        Ok(self.store(spec))
    }

    async fn publish(
        &self,
        container: &ContainerHandle,
        address: &str,
    ) -> Result<String, EngineError> {
        let spec = self.spec(container)?;
        let Some(tag) = spec.built_tag else {
            return Err(EngineError::Publish {
                address: address.to_string(),
                detail: "container has no built image".to_string(),
            });
        };

        let retag = vec!["tag".to_string(), tag, address.to_string()];
        let output = run_docker(&retag, "publish", COMMAND_TIMEOUT).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Publish {
                address: address.to_string(),
                detail: stderr.trim().to_string(),
            });
        }

        let push = vec!["push".to_string(), address.to_string()];
        let output = run_docker(&push, "publish", COMMAND_TIMEOUT).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Publish {
                address: address.to_string(),
                detail: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(digest_from_push_output(&stdout).unwrap_or_else(|| address.to_string()))
    }

    async fn with_registry_auth(
        &self,
        container: &ContainerHandle,
        address: &str,
        username: &str,
        secret: &str,
    ) -> Result<ContainerHandle, EngineError> {
        let spec = self.spec(container)?;

        let mut child = Command::new("docker")
            .args(["login", "--username", username, "--password-stdin", address])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(secret.as_bytes()).await?;
        }
        let result = tokio::time::timeout(CONNECT_TIMEOUT, child.wait_with_output()).await;
        let output = match result {
            Ok(output) => output?,
            Err(_) => {
                return Err(EngineError::Timeout {
                    op: "login",
                    seconds: CONNECT_TIMEOUT.as_secs(),
                })
            }
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Auth {
                address: address.to_string(),
                detail: stderr.trim().to_string(),
            });
        }
        Ok(self.store(spec))
    }
}
