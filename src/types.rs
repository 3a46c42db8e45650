use serde::{Deserialize, Serialize};

/// How a job's stdout/stderr file is opened at launch.
///
/// - `Truncate`: the file is left over from an earlier run (older than the
///   current run start) and is overwritten.
/// - `Append`: the file was already written during this run, so this launch
///   is a resumed invocation and keeps the earlier output.
/// - `Create`: no file yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Truncate,
    Append,
    Create,
}

/// Which signal decided that a job failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The start file or stdin file was missing; nothing was launched.
    PreFlight,
    /// The executable could not be resolved or spawned.
    Launch,
    /// The process exited with a non-zero status.
    Runtime,
    /// The wall-clock budget ran out and the process group was killed.
    Timeout,
    /// The target file never advanced, or the error file appeared.
    Signal,
}

/// Outcome of one job invocation.
///
/// The runner only looks at `success`; the rest is for the status stream and
/// the error record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    pub exit_code: i32,
    pub message: String,
    pub failure: Option<FailureKind>,
}

impl ExecutionResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
            message: String::new(),
            failure: None,
        }
    }

    pub fn failed(kind: FailureKind, exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code,
            message: message.into(),
            failure: Some(kind),
        }
    }
}
