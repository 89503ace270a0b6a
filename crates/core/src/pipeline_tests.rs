use super::*;
use crate::env::EnvScanError;
use tempfile::TempDir;

fn snapshot(pairs: &[(&str, &str)]) -> EnvSnapshot {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn base_args(work: &TempDir) -> PipelineArgs {
    PipelineArgs {
        work_dir: work.path().to_string_lossy().into_owned(),
        task_name: "build".to_string(),
        ..Default::default()
    }
}

#[test]
fn empty_mount_and_target_inherit_upward() {
    let work = TempDir::new().unwrap();
    let ctx = PipelineContext::new(base_args(&work), snapshot(&[])).unwrap();
    assert_eq!(ctx.options.mount_dir.path, ctx.options.work_dir.path);
    assert_eq!(ctx.options.target_dir.path, ctx.options.mount_dir.path);
}

#[test]
fn mount_outside_work_is_rejected() {
    let work = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();
    let mut args = base_args(&work);
    args.mount_dir = other.path().to_string_lossy().into_owned();
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::Directory(_)));
}

#[test]
fn target_resolves_relative_to_mount() {
    let work = TempDir::new().unwrap();
    std::fs::create_dir_all(work.path().join("svc/api")).unwrap();
    let mut args = base_args(&work);
    args.mount_dir = "svc".to_string();
    args.target_dir = "api".to_string();
    let ctx = PipelineContext::new(args, snapshot(&[])).unwrap();
    assert!(ctx.options.target_dir.path.ends_with("svc/api"));
}

#[test]
fn task_name_is_normalized_uppercase() {
    let work = TempDir::new().unwrap();
    let mut args = base_args(&work);
    args.task_name = "  build ".to_string();
    let ctx = PipelineContext::new(args, snapshot(&[])).unwrap();
    assert_eq!(ctx.options.task_name, "BUILD");
}

#[test]
fn blank_task_name_is_rejected() {
    let work = TempDir::new().unwrap();
    let mut args = base_args(&work);
    args.task_name = "   ".to_string();
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTaskName(_)));
}

#[test]
fn unexported_scan_keys_fail_validation() {
    let work = TempDir::new().unwrap();
    let mut args = base_args(&work);
    args.env_keys_to_scan = vec!["NOT_EXPORTED_ANYWHERE".to_string()];
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::MissingExportedKeys { .. }));
}

#[test]
fn aws_toggle_without_credentials_fails() {
    let work = TempDir::new().unwrap();
    let mut args = base_args(&work);
    args.scan_aws = true;
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Env(EnvScanError::CredentialsNotSet(_))
    ));
}

#[test]
fn aws_toggle_with_credentials_passes() {
    let work = TempDir::new().unwrap();
    let mut args = base_args(&work);
    args.scan_aws = true;
    let snap = snapshot(&[
        ("AWS_ACCESS_KEY_ID", "AKIA"),
        ("AWS_SECRET_ACCESS_KEY", "secret"),
    ]);
    assert!(PipelineContext::new(args, snap).is_ok());
}

#[test]
fn terraform_toggle_without_vars_fails() {
    let work = TempDir::new().unwrap();
    let mut args = base_args(&work);
    args.scan_terraform = true;
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Env(EnvScanError::NoMatchingEnvVars(_))
    ));
}

#[test]
fn dotenv_file_is_validated_up_front() {
    let work = TempDir::new().unwrap();
    let dotenv = work.path().join(".env");
    std::fs::write(&dotenv, "BROKEN-LINE\n").unwrap();
    let mut args = base_args(&work);
    args.dotenv_file = Some(dotenv);
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Env(EnvScanError::MalformedLine { .. })
    ));
}

#[test]
fn prefix_list_must_yield_variables() {
    let work = TempDir::new().unwrap();
    let mut args = base_args(&work);
    args.scan_prefixes = vec!["NOPE_".to_string()];
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Env(EnvScanError::NoMatchingEnvVars(_))
    ));
}

#[test]
fn explicit_pairs_with_empty_value_fail() {
    let work = TempDir::new().unwrap();
    let mut args = base_args(&work);
    args.env_pairs_to_set.insert("K".to_string(), String::new());
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Env(EnvScanError::InconsistentEnvVar(_))
    ));
}
