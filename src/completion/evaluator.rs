// src/completion/evaluator.rs

use std::path::Path;

use tracing::{debug, info};

use crate::completion::target::{TargetReference, wait_for_target};
use crate::config::TargetSection;
use crate::types::{ExecutionResult, FailureKind};

/// Decide PASS/FAIL for a job that exited on its own.
///
/// Rules, in order:
/// 1. a non-zero exit code fails the job with `os_message`;
/// 2. with a target file, its mtime must advance past the captured
///    reference within the configured window;
/// 3. with an error file, its presence fails the job even if rule 2 passed;
/// 4. otherwise exit code zero is success.
///
/// Timeouts never reach this function: a killed job has already failed.
pub async fn evaluate(
    exit_code: i32,
    os_message: &str,
    target: Option<&TargetReference>,
    error_file: Option<&Path>,
    target_cfg: &TargetSection,
) -> ExecutionResult {
    if exit_code != 0 {
        return ExecutionResult::failed(FailureKind::Runtime, exit_code, os_message);
    }

    let mut verdict = ExecutionResult::success();

    if let Some(target) = target {
        let outcome =
            wait_for_target(target, target_cfg.poll_interval(), target_cfg.timeout()).await;
        debug!(target_file = %target.path().display(), ?outcome, "target file check");
        if let Some(message) = outcome.failure_message(target.path()) {
            verdict = ExecutionResult::failed(FailureKind::Signal, 0, message);
        }
    }

    if let Some(error_file) = error_file {
        if error_file.exists() {
            info!(error_file = %error_file.display(), "error file present after job exit");
            verdict = ExecutionResult::failed(
                FailureKind::Signal,
                1,
                format!("Found the error file:{} - job failed.", error_file.display()),
            );
        }
    }

    verdict
}
