// src/errors.rs

//! Crate-wide error types.
//!
//! Per-job failures (non-zero exit, timeout, stale target file, ...) are not
//! errors: they travel as [`ExecutionResult`](crate::types::ExecutionResult)
//! values so the runner can report them. The types here cover the cases where
//! the dispatcher itself cannot proceed.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Manifest error: {0}")]
    ManifestError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Reasons a job could not be started at all.
///
/// All of these are detected before the child process exists.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("executable '{0}' not found")]
    ExecutableNotFound(String),

    #[error("file '{}' is not executable", .0.display())]
    NotExecutable(PathBuf),

    #[error("'{}' is a directory, not an executable", .0.display())]
    IsDirectory(PathBuf),

    #[error("could not locate stdin file: {}", .0.display())]
    StdinMissing(PathBuf),

    #[error("spawning '{program}' failed: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("preparing '{}' failed: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DispatchError>;
