// src/report/status.rs

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::types::{ExecutionResult, FailureKind};

/// Discriminant of a [`StatusEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Init,
    JobStart,
    JobEnd,
    Finish,
}

/// One entry of the status stream. Serialized as one JSON object per line,
/// tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusEvent {
    Init {
        timestamp: DateTime<Utc>,
        jobs: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ert_pid: Option<String>,
        /// Set when the requested jobs do not exist; the run stops here.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    JobStart {
        timestamp: DateTime<Utc>,
        job: String,
    },
    JobEnd {
        timestamp: DateTime<Utc>,
        job: String,
        success: bool,
        exit_code: i32,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failure: Option<FailureKind>,
    },
    Finish {
        timestamp: DateTime<Utc>,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl StatusEvent {
    pub fn init(
        jobs: Vec<String>,
        run_id: Option<String>,
        ert_pid: Option<String>,
        error: Option<String>,
    ) -> Self {
        StatusEvent::Init {
            timestamp: Utc::now(),
            jobs,
            run_id,
            ert_pid,
            error,
        }
    }

    pub fn job_start(job: &str) -> Self {
        StatusEvent::JobStart {
            timestamp: Utc::now(),
            job: job.to_string(),
        }
    }

    pub fn job_end(job: &str, result: &ExecutionResult) -> Self {
        StatusEvent::JobEnd {
            timestamp: Utc::now(),
            job: job.to_string(),
            success: result.success,
            exit_code: result.exit_code,
            message: result.message.clone(),
            failure: result.failure,
        }
    }

    pub fn finish(error: Option<String>) -> Self {
        StatusEvent::Finish {
            timestamp: Utc::now(),
            success: error.is_none(),
            error,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            StatusEvent::Init { .. } => EventKind::Init,
            StatusEvent::JobStart { .. } => EventKind::JobStart,
            StatusEvent::JobEnd { .. } => EventKind::JobEnd,
            StatusEvent::Finish { .. } => EventKind::Finish,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            StatusEvent::Init { timestamp, .. }
            | StatusEvent::JobStart { timestamp, .. }
            | StatusEvent::JobEnd { timestamp, .. }
            | StatusEvent::Finish { timestamp, .. } => *timestamp,
        }
    }

    pub fn job(&self) -> Option<&str> {
        match self {
            StatusEvent::JobStart { job, .. } | StatusEvent::JobEnd { job, .. } => Some(job),
            _ => None,
        }
    }

    /// `false` for a failed job end, a failed finish, or an init error.
    pub fn success(&self) -> bool {
        match self {
            StatusEvent::Init { error, .. } => error.is_none(),
            StatusEvent::JobStart { .. } => true,
            StatusEvent::JobEnd { success, .. } | StatusEvent::Finish { success, .. } => *success,
        }
    }
}

/// Read a status stream written by [`FileReporter`](super::FileReporter).
///
/// A trailing line that does not parse is ignored: the writer may have been
/// killed mid-line.
pub fn read_status_stream(path: &Path) -> Result<Vec<StatusEvent>> {
    let contents = fs::read_to_string(path)?;
    let lines: Vec<&str> = contents.lines().filter(|l| !l.trim().is_empty()).collect();

    let mut events = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        match serde_json::from_str(line) {
            Ok(event) => events.push(event),
            Err(_) if index + 1 == lines.len() => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(events)
}
