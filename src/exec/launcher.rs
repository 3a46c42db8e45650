// src/exec/launcher.rs

//! Spawning a single job process.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Instant, SystemTime};

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::errors::LaunchError;
use crate::exec::redirect::{open_input, open_output};
use crate::manifest::{JobEnvironment, JobSpec};

/// A running job: the child process, which leads its own process group.
#[derive(Debug)]
pub struct ProcessHandle {
    pub child: Child,
    /// Process group id; equal to the child's pid.
    pub pgid: i32,
    pub started: Instant,
}

/// Resolve `executable` the way `execvp` would, but report why it cannot be
/// run instead of failing inside the child.
///
/// Names containing a `/` are taken relative to `working_dir`; bare names are
/// searched in the `PATH` of `env`.
pub fn resolve_executable(
    executable: &str,
    env: &JobEnvironment,
    working_dir: &Path,
) -> Result<PathBuf, LaunchError> {
    if executable.contains('/') {
        let path = working_dir.join(executable);
        check_executable(&path)?;
        return Ok(path);
    }

    let search_path = env.get("PATH").unwrap_or_default();
    for dir in search_path.split(':').filter(|d| !d.is_empty()) {
        let candidate = working_dir.join(dir).join(executable);
        if check_executable(&candidate).is_ok() {
            return Ok(candidate);
        }
    }

    Err(LaunchError::ExecutableNotFound(executable.to_string()))
}

fn check_executable(path: &Path) -> Result<(), LaunchError> {
    let meta = fs::metadata(path)
        .map_err(|_| LaunchError::ExecutableNotFound(path.display().to_string()))?;
    if meta.is_dir() {
        return Err(LaunchError::IsDirectory(path.to_path_buf()));
    }
    if !meta.is_file() || meta.permissions().mode() & 0o111 == 0 {
        return Err(LaunchError::NotExecutable(path.to_path_buf()));
    }
    Ok(())
}

/// Launch `job` inside `working_dir`.
///
/// The executable is checked before any output file is touched. stdout and
/// stderr are opened with the stale/resume policy of
/// [`open_output`](crate::exec::redirect::open_output) relative to
/// `run_start`. The child gets exactly `env` overlaid with the job's own
/// environment and becomes the leader of a new process group.
pub fn launch(
    job: &JobSpec,
    working_dir: &Path,
    env: &JobEnvironment,
    run_start: SystemTime,
) -> Result<ProcessHandle, LaunchError> {
    let job_env = env.overlay(&job.environment);
    let program = resolve_executable(&job.executable, &job_env, working_dir)?;

    let stdin = match &job.stdin {
        Some(path) => {
            let path = working_dir.join(path);
            let file = open_input(&path).map_err(|_| LaunchError::StdinMissing(path.clone()))?;
            Stdio::from(file)
        }
        None => Stdio::inherit(),
    };
    let stdout = redirect_output(job.stdout.as_deref(), working_dir, run_start)?;
    let stderr = redirect_output(job.stderr.as_deref(), working_dir, run_start)?;

    let mut cmd = Command::new(&program);
    cmd.args(&job.arg_list)
        .current_dir(working_dir)
        .env_clear()
        .envs(job_env.iter())
        .stdin(stdin)
        .stdout(stdout)
        .stderr(stderr)
        .process_group(0)
        .kill_on_drop(true);

    debug!(job = %job.name, program = %program.display(), args = ?job.arg_list, "spawning job");

    let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
        program: program.display().to_string(),
        source,
    })?;
    let pid = child.id().ok_or_else(|| LaunchError::Spawn {
        program: program.display().to_string(),
        source: std::io::Error::other("child exited before its pid was read"),
    })?;

    info!(job = %job.name, pid, "job process started");

    Ok(ProcessHandle {
        child,
        pgid: pid as i32,
        started: Instant::now(),
    })
}

fn redirect_output(
    path: Option<&Path>,
    working_dir: &Path,
    run_start: SystemTime,
) -> Result<Stdio, LaunchError> {
    let Some(path) = path else {
        return Ok(Stdio::inherit());
    };
    let path = working_dir.join(path);
    let (file, _mode) = open_output(&path, run_start).map_err(|source| LaunchError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(Stdio::from(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_env() -> JobEnvironment {
        JobEnvironment::from_vars([("PATH", "/usr/bin:/bin")])
    }

    #[test]
    fn bare_name_is_found_in_path() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_executable("sh", &path_env(), dir.path()).unwrap();
        assert!(resolved.ends_with("sh"));
    }

    #[test]
    fn unknown_bare_name_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_executable("no-such-program-xyz", &path_env(), dir.path()).unwrap_err();
        assert!(matches!(err, LaunchError::ExecutableNotFound(_)));
    }

    #[test]
    fn directory_and_non_executable_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("script.sh"), "#!/bin/sh\nexit 1\n").unwrap();

        let err = resolve_executable("./subdir", &path_env(), dir.path()).unwrap_err();
        assert!(matches!(err, LaunchError::IsDirectory(_)));

        let err = resolve_executable("./script.sh", &path_env(), dir.path()).unwrap_err();
        assert!(matches!(err, LaunchError::NotExecutable(_)));

        let err = resolve_executable("this/is/not/a/file", &path_env(), dir.path()).unwrap_err();
        assert!(matches!(err, LaunchError::ExecutableNotFound(_)));
    }

    #[test]
    fn missing_executable_creates_no_output_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = JobSpec::new("MISSING", "./nope");
        job.stdout = Some(PathBuf::from("nope.stdout"));

        let err = launch(&job, dir.path(), &path_env(), SystemTime::now()).unwrap_err();
        assert!(matches!(err, LaunchError::ExecutableNotFound(_)));
        assert!(!dir.path().join("nope.stdout").exists());
    }

    #[test]
    fn missing_stdin_fails_before_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = JobSpec::new("CAT", "cat");
        job.stdin = Some(PathBuf::from("input.txt"));

        let err = launch(&job, dir.path(), &path_env(), SystemTime::now()).unwrap_err();
        assert!(matches!(err, LaunchError::StdinMissing(_)));
    }
}
