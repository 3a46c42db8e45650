// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runner talks to an `ExecutorBackend` instead of spawning processes
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production path in [`RealExecutorBackend`].
//!
//! `RealExecutorBackend` runs one job end to end: pre-flight checks, license,
//! launch, timeout supervision and completion evaluation. Every failure is
//! turned into a failed [`ExecutionResult`] so the runner can report it.

use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use crate::completion::{TargetReference, evaluate};
use crate::config::{DispatchConfig, SupervisorSection, TargetSection};
use crate::exec::launcher::launch;
use crate::exec::supervisor::{Supervision, describe_exit, exit_code, supervise};
use crate::license::LicenseGate;
use crate::manifest::{JobEnvironment, JobSpec};
use crate::types::{ExecutionResult, FailureKind};

/// Trait abstracting how a single job is executed.
///
/// Production code uses [`RealExecutorBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ExecutorBackend: Send {
    /// Run `job` to completion and report its outcome.
    fn run_job<'a>(
        &'a mut self,
        job: &'a JobSpec,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + 'a>>;
}

/// Real executor backend used in production.
#[derive(Debug, Clone)]
pub struct RealExecutorBackend {
    working_dir: PathBuf,
    env: JobEnvironment,
    run_start: SystemTime,
    gate: LicenseGate,
    target: TargetSection,
    supervisor: SupervisorSection,
}

impl RealExecutorBackend {
    /// Backend for a run starting now.
    pub fn new(working_dir: impl Into<PathBuf>, env: JobEnvironment, config: &DispatchConfig) -> Self {
        Self::with_run_start(working_dir, env, config, SystemTime::now())
    }

    /// Backend with an explicit run start, which decides whether existing
    /// output files are truncated or appended to.
    pub fn with_run_start(
        working_dir: impl Into<PathBuf>,
        env: JobEnvironment,
        config: &DispatchConfig,
        run_start: SystemTime,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            env,
            run_start,
            gate: LicenseGate::new(config.license.poll_interval()),
            target: config.target.clone(),
            supervisor: config.supervisor.clone(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    async fn execute(&self, job: &JobSpec) -> ExecutionResult {
        if let Some(failure) = self.pre_flight(job) {
            return failure;
        }

        let mut lease = match self.gate.acquire(job).await {
            Ok(lease) => lease,
            Err(e) => {
                return ExecutionResult::failed(
                    FailureKind::Launch,
                    -1,
                    format!("license acquisition for {} failed: {e}", job.name),
                );
            }
        };

        let result = self.execute_licensed(job).await;
        lease.release();
        result
    }

    /// Missing start or stdin files reject the job before anything else.
    fn pre_flight(&self, job: &JobSpec) -> Option<ExecutionResult> {
        if let Some(start_file) = &job.start_file {
            if !self.working_dir.join(start_file).exists() {
                return Some(ExecutionResult::failed(
                    FailureKind::PreFlight,
                    -1,
                    format!("Could not locate start_file:{}", start_file.display()),
                ));
            }
        }
        if let Some(stdin) = &job.stdin {
            if !self.working_dir.join(stdin).exists() {
                return Some(ExecutionResult::failed(
                    FailureKind::PreFlight,
                    0,
                    format!("Could not locate stdin file: {}", stdin.display()),
                ));
            }
        }
        None
    }

    async fn execute_licensed(&self, job: &JobSpec) -> ExecutionResult {
        let error_file = job.error_file.as_ref().map(|p| self.working_dir.join(p));
        if let Some(path) = &error_file {
            if let Err(e) = remove_if_present(path) {
                return io_failure(job, "removing stale error file", e);
            }
        }

        let target = match &job.target_file {
            Some(path) => match TargetReference::capture(&self.working_dir.join(path)) {
                Ok(reference) => Some(reference),
                Err(e) => return io_failure(job, "capturing target file reference", e),
            },
            None => None,
        };

        let mut handle = match launch(job, &self.working_dir, &self.env, self.run_start) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(job = %job.name, error = %e, "job could not be launched");
                return ExecutionResult::failed(FailureKind::Launch, -1, e.to_string());
            }
        };

        let supervision =
            match supervise(&mut handle, job.time_budget(), self.supervisor.poll_interval()).await {
                Ok(s) => s,
                Err(e) => return io_failure(job, "waiting for job process", e),
            };

        match supervision {
            Supervision::TimedOut { status, limit } => ExecutionResult::failed(
                FailureKind::Timeout,
                exit_code(&status),
                timeout_message(&job.name, job.max_running_minutes, limit),
            ),
            Supervision::Exited(status) => {
                let code = exit_code(&status);
                info!(job = %job.name, exit_code = code, "job process exited");
                evaluate(
                    code,
                    &describe_exit(&status),
                    target.as_ref(),
                    error_file.as_deref(),
                    &self.target,
                )
                .await
            }
        }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn run_job<'a>(
        &'a mut self,
        job: &'a JobSpec,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + 'a>> {
        Box::pin(self.execute(job))
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn io_failure(job: &JobSpec, action: &str, err: io::Error) -> ExecutionResult {
    warn!(job = %job.name, action, error = %err, "job aborted by IO error");
    ExecutionResult::failed(FailureKind::Launch, -1, format!("{action} for {}: {err}", job.name))
}

fn timeout_message(name: &str, minutes: Option<f64>, limit: Duration) -> String {
    let minutes = minutes.unwrap_or(limit.as_secs_f64() / 60.0);
    format!("Job:{name} has been running for more than {minutes} minutes - explicitly killed.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_job_and_limit() {
        let msg = timeout_message("SLEEPER", Some(0.01), Duration::from_millis(600));
        assert!(msg.contains("SLEEPER"));
        assert!(msg.contains("0.01 minutes"));
    }

    #[tokio::test]
    async fn missing_start_file_is_rejected_before_launch() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend =
            RealExecutorBackend::new(dir.path(), JobEnvironment::default(), &DispatchConfig::default());
        let mut job = JobSpec::new("A", "/bin/true");
        job.start_file = Some(PathBuf::from("start"));

        let res = backend.run_job(&job).await;
        assert!(!res.success);
        assert_eq!(res.exit_code, -1);
        assert_eq!(res.failure, Some(FailureKind::PreFlight));
        assert!(res.message.contains("start_file"));
    }

    #[tokio::test]
    async fn huge_time_budget_runs_unsupervised() {
        let dir = tempfile::tempdir().unwrap();
        let env = JobEnvironment::from_vars([("PATH", "/usr/bin:/bin")]);
        let mut backend = RealExecutorBackend::new(dir.path(), env, &DispatchConfig::default());
        let mut job = JobSpec::new("LONG", "/bin/true");
        job.max_running_minutes = Some(1e20);

        let res = backend.run_job(&job).await;
        assert!(res.success, "{}", res.message);
    }

    #[tokio::test]
    async fn missing_stdin_is_rejected_with_exit_code_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend =
            RealExecutorBackend::new(dir.path(), JobEnvironment::default(), &DispatchConfig::default());
        let mut job = JobSpec::new("A", "/bin/cat");
        job.stdin = Some(PathBuf::from("input"));

        let res = backend.run_job(&job).await;
        assert!(!res.success);
        assert_eq!(res.exit_code, 0);
        assert!(res.message.contains("stdin"));
    }
}
