// src/exec/supervisor.rs

//! Wall-clock timeout supervisor.
//!
//! The supervisor only observes liveness (`try_wait`) on a fixed poll
//! interval; it never touches the child's output streams. When the budget
//! runs out the whole process group is killed, so grandchildren spawned by
//! the job go down with it.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tracing::{debug, warn};

use crate::exec::launcher::ProcessHandle;

/// How supervision ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Supervision {
    /// The process exited on its own within the budget.
    Exited(ExitStatus),
    /// The budget was exceeded and the process group was killed.
    TimedOut { status: ExitStatus, limit: Duration },
}

/// Wait for the job to finish, killing its process group if it runs longer
/// than `budget`. With no budget this is a plain wait.
pub async fn supervise(
    handle: &mut ProcessHandle,
    budget: Option<Duration>,
    poll_interval: Duration,
) -> io::Result<Supervision> {
    let Some(limit) = budget else {
        let status = handle.child.wait().await?;
        return Ok(Supervision::Exited(status));
    };

    loop {
        if let Some(status) = handle.child.try_wait()? {
            return Ok(Supervision::Exited(status));
        }

        let elapsed = handle.started.elapsed();
        if elapsed >= limit {
            warn!(
                pgid = handle.pgid,
                limit_secs = limit.as_secs_f64(),
                "job exceeded its wall-clock budget; killing process group"
            );
            kill_process_group(handle.pgid)?;
            let status = handle.child.wait().await?;
            return Ok(Supervision::TimedOut { status, limit });
        }

        let remaining = limit - elapsed;
        tokio::time::sleep(poll_interval.min(remaining)).await;
    }
}

/// Send `SIGKILL` to every process in group `pgid`.
///
/// A group that no longer exists is not an error.
pub fn kill_process_group(pgid: i32) -> io::Result<()> {
    // SAFETY: killpg has no memory-safety preconditions.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        debug!(pgid, "process group already gone");
        return Ok(());
    }
    Err(err)
}

/// Exit code as reported to consumers: the process's own code, or
/// `128 + signal` when it was terminated by a signal.
pub fn exit_code(status: &ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    match status.code() {
        Some(code) => code,
        None => status.signal().map(|s| 128 + s).unwrap_or(1),
    }
}

/// Human-readable description of how the process ended.
pub fn describe_exit(status: &ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => format!("Process exited with status code {code}"),
        (None, Some(sig)) => format!("Process terminated by signal {sig}"),
        (None, None) => "Process terminated abnormally".to_string(),
    }
}
