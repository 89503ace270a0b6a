// SPDX-License-Identifier: MIT

//! Fake engine and cloud implementations for testing.
//!
//! Both record every call and support configurable failure modes. The
//! fake engine answers `directory_entries` from a preset map when one
//! was registered for the path, and from the real filesystem otherwise
//! so tempdir-based tests see actual files.

use crate::cloud::{
    AwsCredentials, CloudClient, CloudError, RegistryAuth, ServiceUpdate, TaskDefinition,
};
use crate::engine::{ContainerHandle, DirectoryHandle, Engine, EngineError, ExecResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Recorded call to an engine method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Connect,
    HostDirectory {
        path: PathBuf,
    },
    DirectoryEntries {
        dir: String,
    },
    FromImage {
        image: String,
    },
    WithEnv {
        container: ContainerHandle,
        key: String,
        value: String,
    },
    Mount {
        container: ContainerHandle,
        dir: String,
        mount_path: String,
        exec_path: String,
    },
    Exec {
        container: ContainerHandle,
        argv: Vec<String>,
    },
    Build {
        container: ContainerHandle,
        dir: String,
    },
    Publish {
        container: ContainerHandle,
        address: String,
    },
    WithRegistryAuth {
        container: ContainerHandle,
        address: String,
        username: String,
    },
}

/// Shared state for the fake engine
#[derive(Debug, Default)]
struct EngineState {
    calls: Vec<EngineCall>,
    next_handle: u64,
    // Preset directory listings, keyed by host path
    entries: HashMap<PathBuf, Vec<String>>,
    // Scripted exec results, consumed in order; exit 0 once exhausted
    exec_results: Vec<ExecResult>,
    // Configurable failure modes
    connect_fails: bool,
    build_fails: bool,
    publish_fails: bool,
}

/// Fake execution engine with call recording
#[derive(Debug, Clone)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState::default())),
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Register a fixed entry listing for a host path.
    pub fn set_entries(&self, path: impl Into<PathBuf>, entries: Vec<String>) {
        self.state.lock().unwrap().entries.insert(path.into(), entries);
    }

    /// Queue an exec result; results are consumed in order.
    pub fn push_exec_result(&self, result: ExecResult) {
        self.state.lock().unwrap().exec_results.push(result);
    }

    pub fn set_connect_fails(&self, fails: bool) {
        self.state.lock().unwrap().connect_fails = fails;
    }

    pub fn set_build_fails(&self, fails: bool) {
        self.state.lock().unwrap().build_fails = fails;
    }

    pub fn set_publish_fails(&self, fails: bool) {
        self.state.lock().unwrap().publish_fails = fails;
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn connect(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Connect);
        if state.connect_fails {
            return Err(EngineError::Connect("fake engine refused".to_string()));
        }
        Ok(())
    }

    async fn host_directory(&self, path: &Path) -> Result<DirectoryHandle, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::HostDirectory {
            path: path.to_path_buf(),
        });
        Ok(DirectoryHandle(path.to_string_lossy().into_owned()))
    }

    async fn directory_entries(&self, dir: &DirectoryHandle) -> Result<Vec<String>, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::DirectoryEntries {
            dir: dir.0.clone(),
        });
        if let Some(entries) = state.entries.get(Path::new(&dir.0)) {
            return Ok(entries.clone());
        }
        drop(state);
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir.0)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn from_image(&self, image: &str) -> Result<ContainerHandle, EngineError> {
        let mut state = self.state.lock().unwrap();
        if image.is_empty() {
            return Err(EngineError::EmptyImage);
        }
        state.calls.push(EngineCall::FromImage {
            image: image.to_string(),
        });
        state.next_handle += 1;
        Ok(ContainerHandle(state.next_handle))
    }

    async fn with_env(
        &self,
        container: &ContainerHandle,
        key: &str,
        value: &str,
    ) -> Result<ContainerHandle, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::WithEnv {
            container: *container,
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(*container)
    }

    async fn mount(
        &self,
        container: &ContainerHandle,
        dir: &DirectoryHandle,
        mount_path: &str,
        exec_path: &str,
    ) -> Result<ContainerHandle, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Mount {
            container: *container,
            dir: dir.0.clone(),
            mount_path: mount_path.to_string(),
            exec_path: exec_path.to_string(),
        });
        Ok(*container)
    }

    async fn exec(
        &self,
        container: &ContainerHandle,
        argv: &[String],
        _capture_stdout: bool,
    ) -> Result<ExecResult, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Exec {
            container: *container,
            argv: argv.to_vec(),
        });
        if state.exec_results.is_empty() {
            return Ok(ExecResult {
                exit_code: 0,
                stdout: None,
            });
        }
        Ok(state.exec_results.remove(0))
    }

    async fn build(
        &self,
        container: &ContainerHandle,
        dir: &DirectoryHandle,
    ) -> Result<ContainerHandle, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Build {
            container: *container,
            dir: dir.0.clone(),
        });
        if state.build_fails {
            return Err(EngineError::Build("fake build failure".to_string()));
        }
        state.next_handle += 1;
        Ok(ContainerHandle(state.next_handle))
    }

    async fn publish(
        &self,
        container: &ContainerHandle,
        address: &str,
    ) -> Result<String, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Publish {
            container: *container,
            address: address.to_string(),
        });
        if state.publish_fails {
            return Err(EngineError::Publish {
                address: address.to_string(),
                detail: "fake publish failure".to_string(),
            });
        }
        Ok(format!("{address}@sha256:deadbeef"))
    }

    async fn with_registry_auth(
        &self,
        container: &ContainerHandle,
        address: &str,
        username: &str,
        _secret: &str,
    ) -> Result<ContainerHandle, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::WithRegistryAuth {
            container: *container,
            address: address.to_string(),
            username: username.to_string(),
        });
        Ok(*container)
    }
}

/// Recorded call to a cloud method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudCall {
    Credentials,
    RegistryLogin { registry: String },
    DescribeTaskDefinition { family: String },
    RegisterTaskDefinition { definition: TaskDefinition },
    UpdateService { update: ServiceUpdate },
}

/// Shared state for the fake cloud client
#[derive(Default)]
struct CloudState {
    calls: Vec<CloudCall>,
    credentials: Option<AwsCredentials>,
    task_definitions: HashMap<String, TaskDefinition>,
    registered: Vec<TaskDefinition>,
    next_revision: u32,
    login_fails: bool,
    update_fails: bool,
}

/// Fake cloud client with call recording
#[derive(Clone)]
pub struct FakeCloud {
    state: Arc<Mutex<CloudState>>,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CloudState::default())),
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<CloudCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn set_credentials(&self, credentials: AwsCredentials) {
        self.state.lock().unwrap().credentials = Some(credentials);
    }

    pub fn set_task_definition(&self, definition: TaskDefinition) {
        self.state
            .lock()
            .unwrap()
            .task_definitions
            .insert(definition.family.clone(), definition);
    }

    /// Task definitions passed to `register_task_definition`.
    pub fn registered(&self) -> Vec<TaskDefinition> {
        self.state.lock().unwrap().registered.clone()
    }

    pub fn set_login_fails(&self, fails: bool) {
        self.state.lock().unwrap().login_fails = fails;
    }

    pub fn set_update_fails(&self, fails: bool) {
        self.state.lock().unwrap().update_fails = fails;
    }
}

#[async_trait]
impl CloudClient for FakeCloud {
    async fn credentials(&self) -> Result<AwsCredentials, CloudError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(CloudCall::Credentials);
        state
            .credentials
            .clone()
            .ok_or_else(|| CloudError::Credentials("no fake credentials set".to_string()))
    }

    async fn registry_login(
        &self,
        registry: &str,
        credentials: &AwsCredentials,
    ) -> Result<RegistryAuth, CloudError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(CloudCall::RegistryLogin {
            registry: registry.to_string(),
        });
        if state.login_fails {
            return Err(CloudError::Login {
                registry: registry.to_string(),
                detail: "fake login failure".to_string(),
            });
        }
        Ok(RegistryAuth {
            username: "AWS".to_string(),
            secret: format!("token-for-{}", credentials.access_key_id),
        })
    }

    async fn describe_task_definition(&self, family: &str) -> Result<TaskDefinition, CloudError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(CloudCall::DescribeTaskDefinition {
            family: family.to_string(),
        });
        state
            .task_definitions
            .get(family)
            .cloned()
            .ok_or_else(|| CloudError::TaskDefinition {
                family: family.to_string(),
                detail: "no such family".to_string(),
            })
    }

    async fn register_task_definition(
        &self,
        definition: &TaskDefinition,
    ) -> Result<String, CloudError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(CloudCall::RegisterTaskDefinition {
            definition: definition.clone(),
        });
        state.registered.push(definition.clone());
        state.next_revision += 1;
        Ok(format!(
            "arn:aws:ecs:eu-west-1:000000000000:task-definition/{}:{}",
            definition.family, state.next_revision
        ))
    }

    async fn update_service(&self, update: &ServiceUpdate) -> Result<(), CloudError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(CloudCall::UpdateService {
            update: update.clone(),
        });
        if state.update_fails {
            return Err(CloudError::UpdateService {
                service: update.service.clone(),
                detail: "fake update failure".to_string(),
            });
        }
        Ok(())
    }
}
