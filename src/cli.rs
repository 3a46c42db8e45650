// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `jobdispatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobdispatch",
    version,
    about = "Run the forward-model jobs of one realization, in order.",
    long_about = None
)]
pub struct CliArgs {
    /// Run directory holding the manifest; all job paths are relative to it.
    ///
    /// Default: the current working directory.
    #[arg(value_name = "RUN_PATH")]
    pub run_path: Option<PathBuf>,

    /// Only run these jobs (manifest order is kept). Default: all jobs.
    #[arg(value_name = "JOB")]
    pub jobs: Vec<String>,

    /// Manifest file, relative to the run path unless absolute.
    #[arg(long, value_name = "PATH", default_value = "jobs.json")]
    pub manifest: PathBuf,

    /// Runner config (TOML). Without it, `Dispatch.toml` in the run path is
    /// used when present, otherwise built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBDISPATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the manifest, print the jobs, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
