//! Shared fixtures for the behavioral specs.

use gantry_core::env::EnvSnapshot;
use gantry_core::pipeline::{PipelineArgs, PipelineContext};
use tempfile::TempDir;

pub fn snapshot(pairs: &[(&str, &str)]) -> EnvSnapshot {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn args_in(work: &TempDir, task: &str) -> PipelineArgs {
    PipelineArgs {
        work_dir: work.path().to_string_lossy().into_owned(),
        task_name: task.to_string(),
        ..Default::default()
    }
}

pub fn context_in(work: &TempDir, task: &str) -> PipelineContext {
    PipelineContext::new(args_in(work, task), snapshot(&[])).unwrap()
}
