use super::*;
use crate::dirs::ResolvedDir;
use crate::engine::DirectoryHandle;
use crate::fakes::{EngineCall, FakeCloud, FakeEngine};
use crate::id::SequentialIdGen;
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

fn task_in(root: &Path) -> Task {
    let ids = SequentialIdGen::new("task");
    Task::new(
        Stack::Docker,
        "BUILD",
        &JobEnv::default(),
        &dirs_for(root),
        CommandSet::default(),
        &ids,
    )
}

#[test]
fn custom_commands_replace_defaults() {
    let set = CommandSet {
        default: vec![vec!["docker".to_string(), "build".to_string()]],
        custom: vec![vec!["true".to_string()]],
    };
    assert_eq!(set.effective(), &[vec!["true".to_string()]]);

    let defaults_only = CommandSet::with_default(vec![vec!["ls".to_string()]]);
    assert_eq!(defaults_only.effective(), &[vec!["ls".to_string()]]);
}

#[test]
fn container_name_carries_random_suffix() {
    let tmp = TempDir::new().unwrap();
    let task = task_in(tmp.path());
    assert!(task.container_name.starts_with("rand-cont-"));
    assert_eq!(task.container_name.len(), "rand-cont-".len() + 5);
}

#[test]
fn merged_env_is_computed_once() {
    let tmp = TempDir::new().unwrap();
    let mut env = JobEnv::default();
    env.aws.insert("AWS_REGION".to_string(), "eu-west-1".to_string());
    env.explicit.insert("AWS_REGION".to_string(), "us-east-1".to_string());
    let ids = SequentialIdGen::new("task");

    let task = Task::new(
        Stack::AwsEcr,
        "PUSH",
        &env,
        &dirs_for(tmp.path()),
        CommandSet::default(),
        &ids,
    );
    // Explicit layer wins over the aws layer.
    assert_eq!(task.env.get("AWS_REGION").map(String::as_str), Some("us-east-1"));
}

#[tokio::test]
async fn verify_entries_reports_missing_file() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("README.md"), "hello").unwrap();
    let task = task_in(tmp.path());
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

    let err = ctx.verify_entries(&["Dockerfile"]).await.unwrap_err();
    assert!(matches!(err, ActionError::Configuration(_)));

    std::fs::write(tmp.path().join("Dockerfile"), "FROM alpine").unwrap();
    let entries = ctx.verify_entries(&["Dockerfile"]).await.unwrap();
    assert!(entries.contains(&"Dockerfile".to_string()));
    assert!(entries.contains(&"README.md".to_string()));
}

#[tokio::test]
async fn mount_uses_the_task_exec_path() {
    let tmp = TempDir::new().unwrap();
    let mut dirs = dirs_for(tmp.path());
    dirs.exec_path = "/build/svc".to_string();
    let ids = SequentialIdGen::new("task");
    let task = Task::new(
        Stack::Docker,
        "BUILD",
        &JobEnv::default(),
        &dirs,
        CommandSet::default(),
        &ids,
    );
    let engine = FakeEngine::new();
    let cloud = FakeCloud::new();
    let params = ActionParams::default();
    let ctx = TaskContext {
        task: &task,
        engine: &engine,
        cloud: &cloud,
        params: &params,
        container: ContainerHandle(7),
    };

    ctx.mount().await.unwrap();
    assert!(engine.calls().iter().any(|c| matches!(
        c,
        EngineCall::Mount { mount_path, exec_path, .. }
            if mount_path == "/build" && exec_path == "/build/svc"
    )));
}

#[tokio::test]
async fn run_commands_stops_on_nonzero_exit() {
    let tmp = TempDir::new().unwrap();
    let task = task_in(tmp.path());
    let engine = FakeEngine::new();
    engine.push_exec_result(ExecResult {
        exit_code: 0,
        stdout: None,
    });
    engine.push_exec_result(ExecResult {
        exit_code: 2,
        stdout: None,
    });
    let cloud = FakeCloud::new();
    let params = ActionParams::default();
    let ctx = TaskContext {
        task: &task,
        engine: &engine,
        cloud: &cloud,
        params: &params,
        container: ContainerHandle(1),
    };

    let commands = vec![
        vec!["first".to_string()],
        vec!["second".to_string()],
        vec!["third".to_string()],
    ];
    let err = ctx.run_commands(ContainerHandle(1), &commands, false).await.unwrap_err();
    match err {
        ActionError::CommandFailed { argv, code } => {
            assert_eq!(argv, vec!["second".to_string()]);
            assert_eq!(code, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    // The third command never ran.
    let execs = engine
        .calls()
        .iter()
        .filter(|c| matches!(c, EngineCall::Exec { .. }))
        .count();
    assert_eq!(execs, 2);
}

#[tokio::test]
async fn env_map_is_applied_pairwise() {
    let tmp = TempDir::new().unwrap();
    let task = task_in(tmp.path());
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

    let mut env = EnvMap::new();
    env.insert("A".to_string(), "1".to_string());
    env.insert("B".to_string(), "2".to_string());
    ctx.with_env_map(ContainerHandle(1), &env).await.unwrap();

    let sets: Vec<_> = engine
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            EngineCall::WithEnv { key, value, .. } => Some((key, value)),
            _ => None,
        })
        .collect();
    assert_eq!(
        sets,
        vec![
            ("A".to_string(), "1".to_string()),
            ("B".to_string(), "2".to_string())
        ]
    );
}
