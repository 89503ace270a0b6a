//! Environment scanning and the ordered merge.

use crate::prelude::*;
use gantry_core::env::{self, EnvMap, EnvScanError, JobEnv};
use tempfile::TempDir;

fn map(pairs: &[(&str, &str)]) -> EnvMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn later_layers_win_on_collision() {
    let mut layers = JobEnv::default();
    layers.aws = map(&[("REGION", "from-aws")]);
    layers.custom = map(&[("REGION", "from-custom")]);
    layers.dotenv = map(&[("REGION", "from-dotenv")]);

    let merged = layers.merged();
    assert_eq!(merged.get("REGION").map(String::as_str), Some("from-dotenv"));
}

#[test]
fn empty_keys_and_values_never_survive_the_merge() {
    let polluted = map(&[("GOOD", "value"), ("EMPTY", ""), ("", "anonymous")]);
    let merged = env::merge([&polluted]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged.get("GOOD").map(String::as_str), Some("value"));
}

#[test]
fn merging_is_idempotent() {
    let mut layers = JobEnv::default();
    layers.terraform = map(&[("TF_VAR_a", "1"), ("TF_VAR_b", "2")]);
    layers.explicit = map(&[("TF_VAR_a", "override")]);

    let once = layers.merged();
    let twice = layers.merged();
    assert_eq!(once, twice);
}

#[test]
fn scanning_the_same_snapshot_twice_gives_the_same_result() {
    let snap = snapshot(&[("TF_VAR_x", "1"), ("TF_VAR_y", "2")]);
    let first = snap.scan_terraform().unwrap();
    let second = snap.scan_terraform().unwrap();
    assert_eq!(first, second);
}

#[test]
fn scanned_values_are_quote_stripped() {
    let snap = snapshot(&[("TF_VAR_name", "\"quoted\"")]);
    let scanned = snap.scan_terraform().unwrap();
    assert_eq!(scanned.get("TF_VAR_name").map(String::as_str), Some("quoted"));
}

#[test]
fn dotenv_files_parse_key_value_lines() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join(".env");
    std::fs::write(&file, "A=1\n\nB=\"two\"\n").unwrap();

    let scanned = env::scan_dotenv(&file).unwrap();
    assert_eq!(scanned.get("A").map(String::as_str), Some("1"));
    assert_eq!(scanned.get("B").map(String::as_str), Some("two"));
}

#[test]
fn a_dotenv_line_without_equals_is_malformed() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join(".env");
    std::fs::write(&file, "A=1\nBROKEN\n").unwrap();

    let err = env::scan_dotenv(&file).unwrap_err();
    assert!(matches!(err, EnvScanError::MalformedLine { line, .. } if line == "BROKEN"));
}

#[test]
fn aws_scan_requires_both_key_halves() {
    let snap = snapshot(&[("AWS_ACCESS_KEY_ID", "AKIA")]);
    let err = snap.scan_aws_credentials().unwrap_err();
    assert!(matches!(err, EnvScanError::CredentialsNotSet(_)));
}

#[test]
fn the_default_region_variant_wins() {
    let snap = snapshot(&[
        ("AWS_ACCESS_KEY_ID", "AKIA"),
        ("AWS_SECRET_ACCESS_KEY", "secret"),
        ("AWS_REGION", "us-east-1"),
        ("AWS_DEFAULT_REGION", "eu-west-1"),
    ]);
    let scanned = snap.scan_aws_credentials().unwrap();
    assert_eq!(scanned.get("AWS_REGION").map(String::as_str), Some("eu-west-1"));
}
