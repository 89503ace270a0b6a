//! End-to-end flows over the fake adapters: pipeline → job → task →
//! dispatch.

use crate::prelude::*;
use gantry_adapters::{FakeCloud, FakeEngine};
use gantry_core::dispatch::{self, ActionParams, Stack};
use gantry_core::env::EnvScanError;
use gantry_core::error::{ActionError, ConfigError, DispatchError, JobError};
use gantry_core::id::SequentialIdGen;
use gantry_core::job::{Job, JobSpec};
use gantry_core::pipeline::PipelineContext;
use gantry_core::task::{CommandSet, Task, TaskContext};
use tempfile::TempDir;

#[tokio::test]
async fn defaults_alone_reach_the_build_action() {
    let work = TempDir::new().unwrap();
    let ctx = context_in(&work, "build");
    let engine = FakeEngine::new();
    let cloud = FakeCloud::new();
    let ids = SequentialIdGen::new("e2e");

    let job = Job::new(&ctx, JobSpec::new("docker:build", Stack::Docker), engine, &ids)
        .await
        .unwrap();
    // No scan toggles: every layer is empty.
    assert!(job.env.merged().is_empty());

    let task = Task::for_job(&job, CommandSet::default(), &ids);
    let params = ActionParams::default();
    let task_ctx = TaskContext {
        task: &task,
        engine: &job.engine,
        cloud: &cloud,
        params: &params,
        container: job.container,
    };

    // The work directory has no Dockerfile, so the build action is
    // reached and rejects its configuration.
    let err = dispatch::dispatch(&task_ctx).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Action(ActionError::Configuration(_))
    ));
}

#[tokio::test]
async fn a_dockerfile_makes_the_default_flow_succeed() {
    let work = TempDir::new().unwrap();
    std::fs::write(work.path().join("Dockerfile"), "FROM alpine").unwrap();
    let ctx = context_in(&work, "build");
    let engine = FakeEngine::new();
    let cloud = FakeCloud::new();
    let ids = SequentialIdGen::new("e2e");

    let job = Job::new(&ctx, JobSpec::new("docker:build", Stack::Docker), engine, &ids)
        .await
        .unwrap();
    let task = Task::for_job(&job, CommandSet::default(), &ids);
    let params = ActionParams::default();
    let task_ctx = TaskContext {
        task: &task,
        engine: &job.engine,
        cloud: &cloud,
        params: &params,
        container: job.container,
    };

    let output = dispatch::dispatch(&task_ctx).await.unwrap();
    assert_eq!(output.exit_code, 0);
    assert!(!output.is_error);
    assert!(output.files.contains(&"Dockerfile".to_string()));
}

#[tokio::test]
async fn an_unmapped_task_name_is_an_error_not_a_no_op() {
    let work = TempDir::new().unwrap();
    std::fs::write(work.path().join("Dockerfile"), "FROM alpine").unwrap();
    let ctx = context_in(&work, "teleport");
    let engine = FakeEngine::new();
    let cloud = FakeCloud::new();
    let ids = SequentialIdGen::new("e2e");

    let job = Job::new(&ctx, JobSpec::new("docker:teleport", Stack::Docker), engine.clone(), &ids)
        .await
        .unwrap();
    let task = Task::for_job(&job, CommandSet::default(), &ids);
    let params = ActionParams::default();
    let task_ctx = TaskContext {
        task: &task,
        engine: &job.engine,
        cloud: &cloud,
        params: &params,
        container: job.container,
    };

    let err = dispatch::dispatch(&task_ctx).await.unwrap_err();
    match err {
        DispatchError::UnknownTask { stack, task } => {
            assert_eq!(stack, Stack::Docker);
            assert_eq!(task, "TELEPORT");
        }
        other => panic!("unexpected error: {other}"),
    }
    // No action ran: the engine saw job construction only.
    assert!(!engine
        .calls()
        .iter()
        .any(|c| matches!(c, gantry_adapters::EngineCall::Exec { .. })));
}

#[test]
fn missing_aws_credentials_fail_pipeline_validation() {
    let work = TempDir::new().unwrap();
    let mut args = args_in(&work, "push");
    args.scan_aws = true;
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Env(EnvScanError::CredentialsNotSet(_))
    ));
}

#[tokio::test]
async fn missing_aws_credentials_fail_job_construction_too() {
    let work = TempDir::new().unwrap();
    // Validation passes with credentials present...
    let mut args = args_in(&work, "push");
    args.scan_aws = true;
    let env = snapshot(&[
        ("AWS_ACCESS_KEY_ID", "AKIA"),
        ("AWS_SECRET_ACCESS_KEY", "secret"),
    ]);
    let ctx = PipelineContext::new(args, env).unwrap();

    // ...but the job re-scans a snapshot where they are gone.
    let stale = PipelineContext {
        options: ctx.options.clone(),
        env: snapshot(&[]),
    };
    let ids = SequentialIdGen::new("e2e");
    let err = Job::new(
        &stale,
        JobSpec::new("aws-ecr:push", Stack::AwsEcr),
        FakeEngine::new(),
        &ids,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        JobError::Env {
            source: EnvScanError::CredentialsNotSet(_),
            ..
        }
    ));
}
