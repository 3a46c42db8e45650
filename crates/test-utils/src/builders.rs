#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use jobdispatch::manifest::{JobSpec, Manifest};

/// Builder for `Manifest` to simplify test setup.
pub struct ManifestBuilder {
    manifest: Manifest,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            manifest: Manifest {
                umask: "0022".to_string(),
                data_root: None,
                run_id: None,
                ert_pid: None,
                global_environment: None,
                global_update_path: None,
                job_list: Vec::new(),
            },
        }
    }

    pub fn with_job(mut self, job: JobSpec) -> Self {
        self.manifest.job_list.push(job);
        self
    }

    pub fn run_id(mut self, run_id: &str) -> Self {
        self.manifest.run_id = Some(run_id.to_string());
        self
    }

    pub fn data_root(mut self, root: &str) -> Self {
        self.manifest.data_root = Some(root.to_string());
        self
    }

    pub fn global_env(mut self, key: &str, value: &str) -> Self {
        self.manifest
            .global_environment
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn update_path(mut self, key: &str, value: &str) -> Self {
        self.manifest
            .global_update_path
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> Manifest {
        self.manifest
    }

    /// Serialize as `jobs.json` into `dir` and return its path.
    pub fn write_to(self, dir: &Path) -> PathBuf {
        let path = dir.join("jobs.json");
        let json = serde_json::to_string_pretty(&self.manifest).expect("serialize manifest");
        fs::write(&path, json).expect("write manifest");
        path
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobSpec`.
pub struct JobSpecBuilder {
    job: JobSpec,
}

impl JobSpecBuilder {
    pub fn new(name: &str, executable: impl AsRef<Path>) -> Self {
        Self {
            job: JobSpec::new(name, executable.as_ref().to_string_lossy()),
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.job.arg_list.push(arg.to_string());
        self
    }

    pub fn stdin(mut self, path: &str) -> Self {
        self.job.stdin = Some(PathBuf::from(path));
        self
    }

    pub fn stdout(mut self, path: &str) -> Self {
        self.job.stdout = Some(PathBuf::from(path));
        self
    }

    pub fn stderr(mut self, path: &str) -> Self {
        self.job.stderr = Some(PathBuf::from(path));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.job.environment.insert(key.to_string(), value.to_string());
        self
    }

    pub fn start_file(mut self, path: &str) -> Self {
        self.job.start_file = Some(PathBuf::from(path));
        self
    }

    pub fn target_file(mut self, path: &str) -> Self {
        self.job.target_file = Some(PathBuf::from(path));
        self
    }

    pub fn error_file(mut self, path: &str) -> Self {
        self.job.error_file = Some(PathBuf::from(path));
        self
    }

    pub fn max_running_minutes(mut self, minutes: f64) -> Self {
        self.job.max_running_minutes = Some(minutes);
        self
    }

    pub fn license(mut self, path: impl AsRef<Path>, max_running: u32) -> Self {
        self.job.license_path = Some(path.as_ref().to_path_buf());
        self.job.max_running = Some(max_running);
        self
    }

    pub fn build(self) -> JobSpec {
        self.job
    }
}
