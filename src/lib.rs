// src/lib.rs

pub mod cli;
pub mod completion;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod license;
pub mod logging;
pub mod manifest;
pub mod report;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{DispatchConfig, default_config_path, load_and_validate, load_or_default};
use crate::engine::{Runner, select_jobs};
use crate::exec::RealExecutorBackend;
use crate::manifest::{JobEnvironment, Manifest, load_manifest};
use crate::report::FileReporter;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - run directory and config resolution
/// - manifest loading and the job environment
/// - the file-backed status reporter
/// - the real executor and the runner loop
///
/// Returns whether every selected job succeeded.
pub async fn run(args: CliArgs) -> Result<bool> {
    let run_path = resolve_run_path(args.run_path.as_deref())?;
    let config = load_config(&run_path, args.config.as_deref())?;

    let manifest_path = run_path.join(&args.manifest);
    let manifest = load_manifest(&manifest_path)
        .with_context(|| format!("loading manifest {}", manifest_path.display()))?;

    if args.dry_run {
        print_dry_run(&run_path, &manifest, &args.jobs);
        return Ok(true);
    }

    if let Some(bits) = manifest.umask_bits() {
        // SAFETY: umask only swaps the process file mode mask.
        let previous = unsafe { libc::umask(bits as libc::mode_t) };
        debug!(umask = format!("{bits:04o}"), previous = format!("{previous:04o}"), "umask set");
    }

    let env = JobEnvironment::for_manifest(JobEnvironment::from_process(), &manifest);

    let reporter = FileReporter::new(&run_path, config.status.clone());
    reporter
        .clear_stale_markers()
        .context("removing stale OK marker")?;

    let executor = RealExecutorBackend::new(&run_path, env, &config);
    info!(run_path = %run_path.display(), jobs = manifest.job_list.len(), "manifest loaded");

    let outcome = Runner::new(&manifest, executor, reporter, &run_path)
        .run(&args.jobs)
        .await?;

    Ok(outcome.success)
}

fn resolve_run_path(run_path: Option<&Path>) -> Result<PathBuf> {
    let path = match run_path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().context("reading current directory")?,
    };
    if !path.is_dir() {
        bail!("run path {} is not a directory", path.display());
    }
    path.canonicalize()
        .with_context(|| format!("resolving run path {}", path.display()))
}

/// An explicit `--config` must exist; the default location is optional.
fn load_config(run_path: &Path, explicit: Option<&Path>) -> Result<DispatchConfig> {
    let config = match explicit {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => load_or_default(run_path.join(default_config_path()))?,
    };
    Ok(config)
}

/// Simple dry-run output: print the jobs that would run, in order.
fn print_dry_run(run_path: &Path, manifest: &Manifest, selection: &[String]) {
    println!("jobdispatch dry-run");
    println!("  run_path = {}", run_path.display());
    println!("  umask = {}", manifest.umask);
    if let Some(run_id) = &manifest.run_id {
        println!("  run_id = {run_id}");
    }
    println!();

    let selected = match select_jobs(&manifest.job_list, selection) {
        Ok(selected) => selected,
        Err(e) => {
            println!("selection error: {e}");
            return;
        }
    };

    println!("jobs ({}):", selected.len());
    for job in selected {
        println!("  - {}", job.name);
        println!("      executable: {}", job.executable);
        if !job.arg_list.is_empty() {
            println!("      args: {:?}", job.arg_list);
        }
        if let Some(stdin) = &job.stdin {
            println!("      stdin: {}", stdin.display());
        }
        if let Some(stdout) = &job.stdout {
            println!("      stdout: {}", stdout.display());
        }
        if let Some(stderr) = &job.stderr {
            println!("      stderr: {}", stderr.display());
        }
        if let Some(target) = &job.target_file {
            println!("      target_file: {}", target.display());
        }
        if let Some(budget) = job.time_budget() {
            println!("      max_running: {}s", budget.as_secs_f64());
        }
        if let (Some(limit), Some(license)) = (job.license_limit(), &job.license_path) {
            println!("      license: {} (max {limit})", license.display());
        }
    }

    debug!("dry-run complete (no execution)");
}
