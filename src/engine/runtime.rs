// src/engine/runtime.rs

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::engine::selection::select_jobs;
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::manifest::{JobSpec, Manifest};
use crate::report::{ErrorRecord, StatusEvent, StatusSink};

/// Finish message of a run that stopped at a failed job.
pub const RUN_FAILED_MESSAGE: &str = "Not all jobs completed successfully.";

/// What a call to [`Runner::run`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    /// Jobs handed to the executor, in order.
    pub attempted: Vec<String>,
    pub failed_job: Option<String>,
}

/// Runs the selected jobs one after another, reporting every step.
///
/// The runner owns no process logic: each job goes through the
/// `ExecutorBackend`, and every lifecycle event goes through the
/// `StatusSink` before the next step starts. The first failed job ends the
/// run; later jobs are never started.
pub struct Runner<E: ExecutorBackend, S: StatusSink> {
    jobs: Vec<JobSpec>,
    run_id: Option<String>,
    ert_pid: Option<String>,
    working_dir: PathBuf,
    executor: E,
    sink: S,
}

impl<E: ExecutorBackend, S: StatusSink> fmt::Debug for Runner<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("jobs", &self.jobs.len())
            .field("run_id", &self.run_id)
            .field("working_dir", &self.working_dir)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend, S: StatusSink> Runner<E, S> {
    pub fn new(manifest: &Manifest, executor: E, sink: S, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs: manifest.job_list.clone(),
            run_id: manifest.run_id.clone(),
            ert_pid: manifest.ert_pid.clone(),
            working_dir: working_dir.into(),
            executor,
            sink,
        }
    }

    /// Run the jobs named in `selection` (all jobs when empty).
    ///
    /// Job failures are part of the outcome. An `Err` means the status sink
    /// could not record an event, so the history is incomplete.
    pub async fn run(mut self, selection: &[String]) -> Result<RunOutcome> {
        let selected = match select_jobs(&self.jobs, selection) {
            Ok(selected) => selected,
            Err(unknown) => {
                warn!(error = %unknown, "requested jobs are not in the manifest");
                let names = self.jobs.iter().map(|j| j.name.clone()).collect();
                self.sink.emit(&StatusEvent::init(
                    names,
                    self.run_id.clone(),
                    self.ert_pid.clone(),
                    Some(unknown.to_string()),
                ))?;
                return Ok(RunOutcome {
                    success: false,
                    attempted: Vec::new(),
                    failed_job: None,
                });
            }
        };

        let names: Vec<String> = selected.iter().map(|j| j.name.clone()).collect();
        info!(jobs = ?names, "dispatch run started");
        self.sink.emit(&StatusEvent::init(
            names,
            self.run_id.clone(),
            self.ert_pid.clone(),
            None,
        ))?;

        let mut attempted = Vec::with_capacity(selected.len());

        for job in selected {
            self.sink.emit(&StatusEvent::job_start(&job.name))?;
            info!(job = %job.name, "job started");
            attempted.push(job.name.clone());

            let result = self.executor.run_job(job).await;
            debug!(job = %job.name, ?result, "job finished");

            if !result.success {
                warn!(
                    job = %job.name,
                    exit_code = result.exit_code,
                    message = %result.message,
                    "job failed; stopping run"
                );
                self.sink
                    .record_error(&ErrorRecord::for_job(job, &result.message, &self.working_dir))?;
                self.sink.emit(&StatusEvent::job_end(&job.name, &result))?;
                self.sink
                    .emit(&StatusEvent::finish(Some(RUN_FAILED_MESSAGE.to_string())))?;
                return Ok(RunOutcome {
                    success: false,
                    attempted,
                    failed_job: Some(job.name.clone()),
                });
            }

            self.sink.emit(&StatusEvent::job_end(&job.name, &result))?;
        }

        self.sink.emit(&StatusEvent::finish(None))?;
        self.sink.mark_success()?;
        info!(jobs = attempted.len(), "dispatch run completed");

        Ok(RunOutcome {
            success: true,
            attempted,
            failed_job: None,
        })
    }
}
