//! Directory resolution and containment.

use crate::prelude::*;
use gantry_core::dirs::DirError;
use gantry_core::error::ConfigError;
use gantry_core::pipeline::PipelineContext;
use tempfile::TempDir;

#[test]
fn unset_directories_inherit_from_their_parent() {
    let work = TempDir::new().unwrap();
    let ctx = context_in(&work, "build");
    assert_eq!(ctx.options.mount_dir.path, ctx.options.work_dir.path);
    assert_eq!(ctx.options.target_dir.path, ctx.options.work_dir.path);
}

#[test]
fn nested_directories_resolve_relative_to_their_parent() {
    let work = TempDir::new().unwrap();
    std::fs::create_dir_all(work.path().join("services/billing")).unwrap();

    let mut args = args_in(&work, "build");
    args.mount_dir = "services".to_string();
    args.target_dir = "billing".to_string();
    let ctx = PipelineContext::new(args, snapshot(&[])).unwrap();

    assert!(ctx.options.mount_dir.path.ends_with("services"));
    assert!(ctx.options.target_dir.path.ends_with("services/billing"));
}

#[test]
fn a_mount_directory_outside_the_work_directory_is_rejected() {
    let work = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();

    let mut args = args_in(&work, "build");
    args.mount_dir = elsewhere.path().to_string_lossy().into_owned();
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::Directory(DirError::NotASubdirectory { .. })
    ));
}

#[test]
fn a_target_escaping_the_mount_via_dotdot_is_rejected() {
    let work = TempDir::new().unwrap();
    std::fs::create_dir_all(work.path().join("inner")).unwrap();

    let mut args = args_in(&work, "build");
    args.work_dir = work.path().join("inner").to_string_lossy().into_owned();
    args.target_dir = "..".to_string();
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::Directory(DirError::NotASubdirectory { .. })
    ));
}

#[test]
fn a_missing_directory_is_reported_as_not_found() {
    let work = TempDir::new().unwrap();
    let mut args = args_in(&work, "build");
    args.mount_dir = "does-not-exist".to_string();
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::Directory(DirError::DirectoryNotFound { .. })
    ));
}

#[test]
fn a_file_cannot_stand_in_for_a_directory() {
    let work = TempDir::new().unwrap();
    std::fs::write(work.path().join("plain.txt"), "x").unwrap();

    let mut args = args_in(&work, "build");
    args.mount_dir = "plain.txt".to_string();
    let err = PipelineContext::new(args, snapshot(&[])).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::Directory(DirError::NotADirectory { .. })
    ));
}
