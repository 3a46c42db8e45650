// src/exec/redirect.rs

//! Standard-stream redirection for job processes.
//!
//! Whether an existing output file is overwritten or appended to depends only
//! on its mtime relative to the run start; [`output_mode`] keeps that
//! decision in one pure function so clock-skew cases can be tested without
//! touching the filesystem.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::SystemTime;

use tracing::debug;

use crate::types::OutputMode;

/// Decide how to open an output file.
///
/// - no file: `Create`
/// - mtime before `run_start`: leftover from an earlier run, `Truncate`
/// - otherwise: written earlier in this run, `Append`
pub fn output_mode(existing_mtime: Option<SystemTime>, run_start: SystemTime) -> OutputMode {
    match existing_mtime {
        None => OutputMode::Create,
        Some(mtime) if mtime < run_start => OutputMode::Truncate,
        Some(_) => OutputMode::Append,
    }
}

/// Open `path` for a job's stdout or stderr according to [`output_mode`].
pub fn open_output(path: &Path, run_start: SystemTime) -> io::Result<(File, OutputMode)> {
    let existing_mtime = match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Some(meta.modified()?),
        Ok(_) => None,
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    let mode = output_mode(existing_mtime, run_start);
    let mut options = OpenOptions::new();
    match mode {
        OutputMode::Append => options.append(true).create(true),
        OutputMode::Truncate | OutputMode::Create => options.write(true).truncate(true).create(true),
    };

    let file = options.open(path)?;
    debug!(path = %path.display(), ?mode, "opened job output file");
    Ok((file, mode))
}

/// Open an existing stdin file read-only.
pub fn open_input(path: &Path) -> io::Result<File> {
    File::open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn missing_file_is_created() {
        let now = SystemTime::now();
        assert_eq!(output_mode(None, now), OutputMode::Create);
    }

    #[test]
    fn mtime_equal_to_run_start_appends() {
        let now = SystemTime::now();
        assert_eq!(output_mode(Some(now), now), OutputMode::Append);
        assert_eq!(
            output_mode(Some(now - Duration::from_nanos(1)), now),
            OutputMode::Truncate
        );
    }

    #[test]
    fn stale_file_is_truncated_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.stdout");
        fs::write(&path, "old content\n").unwrap();

        let run_start = SystemTime::now() + Duration::from_secs(60);
        let (mut file, mode) = open_output(&path, run_start).unwrap();
        assert_eq!(mode, OutputMode::Truncate);
        writeln!(file, "new").unwrap();
        drop(file);

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn fresh_file_is_appended_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.stdout");
        fs::write(&path, "first attempt\n").unwrap();

        let run_start = SystemTime::now() - Duration::from_secs(60);
        let (mut file, mode) = open_output(&path, run_start).unwrap();
        assert_eq!(mode, OutputMode::Append);
        writeln!(file, "second attempt").unwrap();
        drop(file);

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "first attempt\nsecond attempt\n"
        );
    }
}
