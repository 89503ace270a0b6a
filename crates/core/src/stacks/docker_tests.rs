use super::*;
use crate::dirs::ResolvedDir;
use crate::dispatch::{ActionParams, Stack};
use crate::engine::DirectoryHandle;
use crate::fakes::{EngineCall, FakeCloud, FakeEngine};
use crate::id::SequentialIdGen;
use crate::task::{CommandSet, Task};
use crate::env::JobEnv;
use crate::job::JobDirs;
use crate::engine::ContainerHandle;
use std::path::Path;
use tempfile::TempDir;

fn dirs_for(root: &Path) -> JobDirs {
    let dir = ResolvedDir {
        declared: String::new(),
        path: root.to_path_buf(),
    };
    let handle = DirectoryHandle(root.to_string_lossy().into_owned());
    JobDirs {
        root: dir.clone(),
        work: dir.clone(),
        mount: dir.clone(),
        target: dir,
        root_handle: handle.clone(),
        work_handle: handle.clone(),
        mount_handle: handle.clone(),
        target_handle: handle,
        exec_path: "/build".to_string(),
    }
}

fn build_task(root: &Path, commands: CommandSet) -> Task {
    let ids = SequentialIdGen::new("task");
    Task::new(Stack::Docker, "BUILD", &JobEnv::default(), &dirs_for(root), commands, &ids)
}

#[tokio::test]
async fn missing_dockerfile_is_a_configuration_error() {
    let tmp = TempDir::new().unwrap();
    let task = build_task(tmp.path(), CommandSet::default());
    let engine = FakeEngine::new();
    let cloud = FakeCloud::new();
    let params = ActionParams::default();
    let ctx = TaskContext {
        task: &task,
        engine: &engine,
        cloud: &cloud,
        params: &params,
        container: ContainerHandle(1),
    };

    let err = BuildAction::new().run(&ctx).await.unwrap_err();
    assert!(matches!(err, ActionError::Configuration(_)));
    // Nothing was mounted or built.
    assert!(!engine
        .calls()
        .iter()
        .any(|c| matches!(c, EngineCall::Mount { .. } | EngineCall::Build { .. })));
}

#[tokio::test]
async fn build_mounts_then_builds() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Dockerfile"), "FROM alpine").unwrap();
    let task = build_task(tmp.path(), CommandSet::default());
    let engine = FakeEngine::new();
    let cloud = FakeCloud::new();
    let params = ActionParams::default();
    let ctx = TaskContext {
        task: &task,
        engine: &engine,
        cloud: &cloud,
        params: &params,
        container: ContainerHandle(1),
    };

    let output = BuildAction::new().run(&ctx).await.unwrap();
    assert_eq!(output.exit_code, 0);
    assert!(!output.is_error);
    assert!(output.files.contains(&"Dockerfile".to_string()));

    let calls = engine.calls();
    let mount_at = calls
        .iter()
        .position(|c| matches!(c, EngineCall::Mount { .. }))
        .unwrap();
    let build_at = calls
        .iter()
        .position(|c| matches!(c, EngineCall::Build { .. }))
        .unwrap();
    assert!(mount_at < build_at);
}

#[tokio::test]
async fn sanity_commands_run_when_none_are_given() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Dockerfile"), "FROM alpine").unwrap();
    let task = build_task(tmp.path(), CommandSet::default());
    let engine = FakeEngine::new();
    let cloud = FakeCloud::new();
    let params = ActionParams::default();
    let ctx = TaskContext {
        task: &task,
        engine: &engine,
        cloud: &cloud,
        params: &params,
        container: ContainerHandle(1),
    };

    BuildAction::new().run(&ctx).await.unwrap();
    let calls = engine.calls();
    let list_at = calls
        .iter()
        .position(|c| matches!(c, EngineCall::Exec { argv, .. } if argv[0] == "ls"))
        .unwrap();
    let cat_at = calls
        .iter()
        .position(|c| {
            matches!(c, EngineCall::Exec { argv, .. } if argv == &["cat", "Dockerfile"])
        })
        .unwrap();
    let build_at = calls
        .iter()
        .position(|c| matches!(c, EngineCall::Build { .. }))
        .unwrap();
    assert!(list_at < cat_at);
    assert!(cat_at < build_at);
}

#[tokio::test]
async fn custom_commands_run_before_the_build() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Dockerfile"), "FROM alpine").unwrap();
    let commands = CommandSet {
        default: Vec::new(),
        custom: vec![vec!["make".to_string(), "generate".to_string()]],
    };
    let task = build_task(tmp.path(), commands);
    let engine = FakeEngine::new();
    let cloud = FakeCloud::new();
    let params = ActionParams::default();
    let ctx = TaskContext {
        task: &task,
        engine: &engine,
        cloud: &cloud,
        params: &params,
        container: ContainerHandle(1),
    };

    BuildAction::new().run(&ctx).await.unwrap();
    let calls = engine.calls();
    let exec_at = calls
        .iter()
        .position(|c| matches!(c, EngineCall::Exec { argv, .. } if argv[0] == "make"))
        .unwrap();
    let build_at = calls
        .iter()
        .position(|c| matches!(c, EngineCall::Build { .. }))
        .unwrap();
    assert!(exec_at < build_at);
    // A custom list replaces the sanity commands wholesale.
    assert!(!calls
        .iter()
        .any(|c| matches!(c, EngineCall::Exec { argv, .. } if argv[0] == "ls")));
}
