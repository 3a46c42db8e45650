// src/completion/target.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use tracing::debug;

/// Reference point a target file's mtime must exceed.
///
/// Captured immediately before launch. If the target already exists its own
/// mtime is the reference. Otherwise a throwaway sentinel is written next to
/// it and the sentinel's mtime (minus one second) is used, so the comparison
/// is made against the file server's clock rather than the local one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReference {
    path: PathBuf,
    reference: SystemTime,
}

const SENTINEL_SUFFIX: &str = "-stat-target";

impl TargetReference {
    pub fn capture(path: &Path) -> io::Result<Self> {
        let reference = match fs::metadata(path) {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => sentinel_reference(path)?,
            Err(e) => return Err(e),
        };
        debug!(target_file = %path.display(), ?reference, "captured target reference");
        Ok(Self {
            path: path.to_path_buf(),
            reference,
        })
    }

    /// Build a reference without touching the filesystem.
    pub fn at(path: impl Into<PathBuf>, reference: SystemTime) -> Self {
        Self {
            path: path.into(),
            reference,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reference(&self) -> SystemTime {
        self.reference
    }

    fn current_mtime(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    fn is_updated(&self) -> bool {
        self.current_mtime().is_some_and(|m| m > self.reference)
    }
}

fn sentinel_reference(target: &Path) -> io::Result<SystemTime> {
    let mut name = target.as_os_str().to_os_string();
    name.push(SENTINEL_SUFFIX);
    let sentinel = PathBuf::from(name);

    fs::write(&sentinel, "This file is here only as a stat() reference")?;
    let mtime = fs::metadata(&sentinel)?.modified()?;
    if let Err(e) = fs::remove_file(&sentinel) {
        debug!(sentinel = %sentinel.display(), error = %e, "could not remove stat sentinel");
    }

    Ok(mtime
        .checked_sub(Duration::from_secs(1))
        .unwrap_or(SystemTime::UNIX_EPOCH))
}

/// Result of waiting for a target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetWait {
    Updated,
    NotUpdated { mtime: SystemTime, reference: SystemTime },
    Missing,
}

impl TargetWait {
    /// Failure message, or `None` for `Updated`.
    pub fn failure_message(&self, path: &Path) -> Option<String> {
        match self {
            TargetWait::Updated => None,
            TargetWait::NotUpdated { mtime, reference } => Some(format!(
                "The target file:{} was not updated; this is flagged as failure. mtime:{:?} reference:{:?}",
                path.display(),
                mtime,
                reference
            )),
            TargetWait::Missing => Some(format!(
                "Target file missing: could not find target_file:{}",
                path.display()
            )),
        }
    }
}

/// Poll until the target's mtime passes the reference, or `timeout` elapses.
///
/// The target may be written asynchronously after the job process has
/// exited (e.g. flushed late by a networked filesystem), hence the wait.
pub async fn wait_for_target(
    target: &TargetReference,
    poll_interval: Duration,
    timeout: Duration,
) -> TargetWait {
    let started = Instant::now();
    loop {
        if target.is_updated() {
            return TargetWait::Updated;
        }
        tokio::time::sleep(poll_interval).await;
        if started.elapsed() > timeout {
            break;
        }
    }

    if target.is_updated() {
        return TargetWait::Updated;
    }
    match target.current_mtime() {
        Some(mtime) => TargetWait::NotUpdated {
            mtime,
            reference: target.reference,
        },
        None => TargetWait::Missing,
    }
}
