// tests/error_handling.rs

use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;

use jobdispatch::cli::CliArgs;
use jobdispatch::config::load_and_validate;
use jobdispatch::errors::DispatchError;
use jobdispatch::manifest::load_manifest;
use jobdispatch::report::{EventKind, read_status_stream};
use jobdispatch_test_utils::builders::{JobSpecBuilder, ManifestBuilder};
use jobdispatch_test_utils::write_script;

fn args_for(dir: &std::path::Path, jobs: &[&str]) -> CliArgs {
    CliArgs {
        run_path: Some(dir.to_path_buf()),
        jobs: jobs.iter().map(|s| s.to_string()).collect(),
        manifest: "jobs.json".into(),
        config: None,
        log_level: None,
        dry_run: false,
    }
}

#[test]
fn test_malformed_manifest_returns_manifest_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"umask": "0002", "jobList": [ "#).unwrap();

    match load_manifest(file.path()) {
        Err(DispatchError::ManifestError(msg)) => assert!(msg.contains("JSON")),
        Err(e) => panic!("Expected ManifestError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_missing_job_list_returns_manifest_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"umask": "0002"}}"#).unwrap();

    assert!(matches!(
        load_manifest(file.path()),
        Err(DispatchError::ManifestError(_))
    ));
}

#[test]
fn test_unreadable_manifest_returns_manifest_error() {
    let dir = tempfile::tempdir().unwrap();
    match load_manifest(dir.path().join("jobs.json")) {
        Err(DispatchError::ManifestError(msg)) => assert!(msg.contains("failed to read")),
        other => panic!("Expected ManifestError, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_invalid_config_interval_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[target]
timeout_secs = -1.0
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(DispatchError::ConfigError(msg)) => assert!(msg.contains("timeout_secs")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_bad_toml_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[status\nstatus_file = ").unwrap();

    assert!(matches!(
        load_and_validate(file.path()),
        Err(DispatchError::TomlError(_))
    ));
}

#[tokio::test]
async fn test_run_rejects_missing_run_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = jobdispatch::run(args_for(&dir.path().join("nope"), &[]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not a directory"));
}

#[tokio::test]
async fn test_run_without_manifest_fails_before_writing_status() {
    let dir = tempfile::tempdir().unwrap();
    let err = jobdispatch::run(args_for(dir.path(), &[])).await.unwrap_err();
    assert!(format!("{err:#}").contains("jobs.json"));
    assert!(!dir.path().join("STATUS").exists());
}

#[tokio::test]
async fn test_explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    ManifestBuilder::new().write_to(dir.path());
    let mut args = args_for(dir.path(), &[]);
    args.config = Some(dir.path().join("missing.toml"));

    assert!(jobdispatch::run(args).await.is_err());
}

#[tokio::test]
async fn test_unknown_job_names_fail_the_run_after_init() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "a.sh", "true");
    ManifestBuilder::new()
        .with_job(JobSpecBuilder::new("A", &script).build())
        .write_to(dir.path());

    let success = jobdispatch::run(args_for(dir.path(), &["B"])).await.unwrap();
    assert!(!success);

    let events = read_status_stream(&dir.path().join("STATUS")).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::Init);
    assert!(!events[0].success());
    assert!(!dir.path().join("ERROR").exists());
}

#[tokio::test]
async fn test_renamed_status_files_are_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "fail.sh", "exit 2");
    ManifestBuilder::new()
        .with_job(JobSpecBuilder::new("FAIL", &script).build())
        .write_to(dir.path());
    fs::write(
        dir.path().join("Dispatch.toml"),
        r#"
[status]
status_file = "status.jsonl"
error_file = "failures.txt"
legacy_exit_file = ""
"#,
    )
    .unwrap();

    let success = jobdispatch::run(args_for(dir.path(), &[])).await.unwrap();
    assert!(!success);
    assert!(dir.path().join("status.jsonl").exists());
    assert!(dir.path().join("failures.txt").exists());
    assert!(!dir.path().join("STATUS").exists());
    assert!(!dir.path().join("EXIT").exists());
}
