// src/report/file_reporter.rs

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use crate::config::StatusSection;
use crate::errors::Result;
use crate::report::StatusSink;
use crate::report::error_record::ErrorRecord;
use crate::report::status::StatusEvent;

/// Writes the status stream, error records and the OK marker into the run
/// directory. Every write is appended and `fsync`'d before returning.
///
/// Neither the status stream nor the error file is reset between
/// invocations against the same run directory: both accumulate, and each
/// invocation's events start at its own `init` event.
#[derive(Debug, Clone)]
pub struct FileReporter {
    dir: PathBuf,
    files: StatusSection,
}

impl FileReporter {
    pub fn new(dir: impl Into<PathBuf>, files: StatusSection) -> Self {
        Self {
            dir: dir.into(),
            files,
        }
    }

    pub fn status_path(&self) -> PathBuf {
        self.dir.join(&self.files.status_file)
    }

    pub fn error_path(&self) -> PathBuf {
        self.dir.join(&self.files.error_file)
    }

    pub fn ok_path(&self) -> PathBuf {
        self.dir.join(&self.files.ok_file)
    }

    fn legacy_exit_path(&self) -> Option<PathBuf> {
        self.files
            .legacy_exit_file
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(|name| self.dir.join(name))
    }

    /// Remove an `OK` marker left by an earlier successful run. Error
    /// records are kept.
    pub fn clear_stale_markers(&self) -> io::Result<()> {
        match fs::remove_file(self.ok_path()) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

fn append_durably(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

impl StatusSink for FileReporter {
    fn emit(&mut self, event: &StatusEvent) -> Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        append_durably(&self.status_path(), &line)?;
        debug!(kind = ?event.kind(), job = ?event.job(), "status event written");
        Ok(())
    }

    fn record_error(&mut self, record: &ErrorRecord) -> Result<()> {
        let error_path = self.error_path();
        append_durably(&error_path, record.render().as_bytes())?;
        if let Some(exit_path) = self.legacy_exit_path() {
            fs::copy(&error_path, &exit_path)?;
        }
        debug!(job = %record.job, "error record written");
        Ok(())
    }

    fn mark_success(&mut self) -> Result<()> {
        let stamp = Local::now().format("%H:%M:%S");
        let mut file = fs::File::create(self.ok_path())?;
        writeln!(file, "All jobs complete {stamp}")?;
        file.sync_all()?;
        Ok(())
    }
}
