// src/report/error_record.rs

//! Failure records appended to the `ERROR` file.
//!
//! The layout is read by the queue driver's EXIT parser and must stay as is:
//!
//! ```text
//! <error>
//!   <time>14:02:11</time>
//!   <job>ECLIPSE100</job>
//!   <reason>Process exited with status code 1</reason>
//!   <stderr>
//! ...captured stderr...</stderr>
//!   <stderr_file>/abs/run/path/ECLIPSE100.stderr</stderr_file>
//! </error>
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::manifest::JobSpec;

/// Captured stderr larger than this is referenced by path only.
pub const MAX_INLINE_STDERR: u64 = 1024 * 1024;

/// What the record says about the job's stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StderrCapture {
    NotRedirected,
    FileMissing(PathBuf),
    Empty { job: String },
    Captured { content: String, path: PathBuf },
    TooLarge { size: u64, path: PathBuf },
}

impl StderrCapture {
    /// Inspect the stderr file configured for `job`, if any.
    pub fn for_job(job: &JobSpec, working_dir: &Path) -> Self {
        let Some(stderr) = &job.stderr else {
            return StderrCapture::NotRedirected;
        };
        let path = working_dir.join(stderr);
        let Ok(meta) = fs::metadata(&path) else {
            return StderrCapture::FileMissing(stderr.clone());
        };
        if meta.len() > MAX_INLINE_STDERR {
            return StderrCapture::TooLarge {
                size: meta.len(),
                path,
            };
        }
        match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => StderrCapture::Empty {
                job: job.name.clone(),
            },
            Ok(bytes) => StderrCapture::Captured {
                content: String::from_utf8_lossy(&bytes).into_owned(),
                path,
            },
            Err(_) => StderrCapture::FileMissing(stderr.clone()),
        }
    }

    fn body(&self) -> String {
        match self {
            StderrCapture::NotRedirected => "<stderr: Not redirected>\n".to_string(),
            StderrCapture::FileMissing(path) => {
                format!("<stderr: Could not find file:{}>\n", path.display())
            }
            StderrCapture::Empty { job } => format!("<Not written by:{job}>\n"),
            StderrCapture::Captured { content, .. } => content.clone(),
            StderrCapture::TooLarge { size, .. } => {
                format!("<stderr: {size} bytes; see stderr_file>\n")
            }
        }
    }

    fn file(&self) -> Option<&Path> {
        match self {
            StderrCapture::Captured { path, .. } | StderrCapture::TooLarge { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub time: DateTime<Local>,
    pub job: String,
    pub reason: String,
    pub stderr: StderrCapture,
}

impl ErrorRecord {
    /// Record for `job` failing with `reason`, capturing its stderr now.
    ///
    /// `working_dir` should be absolute so `stderr_file` is too.
    pub fn for_job(job: &JobSpec, reason: &str, working_dir: &Path) -> Self {
        Self {
            time: Local::now(),
            job: job.name.clone(),
            reason: reason.to_string(),
            stderr: StderrCapture::for_job(job, working_dir),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<error>");
        let _ = writeln!(out, "  <time>{}</time>", self.time.format("%H:%M:%S"));
        let _ = writeln!(out, "  <job>{}</job>", self.job);
        let _ = writeln!(out, "  <reason>{}</reason>", self.reason);

        let mut body = self.stderr.body();
        if !body.ends_with('\n') {
            body.push('\n');
        }
        let _ = write!(out, "  <stderr>\n{body}</stderr>\n");
        if let Some(path) = self.stderr.file() {
            let _ = writeln!(out, "  <stderr_file>{}</stderr_file>", path.display());
        }
        let _ = writeln!(out, "</error>");
        out
    }
}
