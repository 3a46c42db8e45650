// src/manifest/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level manifest as produced by the forward-model planner.
///
/// ```json
/// {
///   "umask": "0002",
///   "DATA_ROOT": "/path/to/data",
///   "run_id": "run-17",
///   "global_environment": {"OMP_NUM_THREADS": "1"},
///   "global_update_path": {"PATH": "/opt/tools/bin"},
///   "jobList": [ { "name": "COPY", "executable": "/bin/cp", "argList": ["a", "b"] } ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Octal umask applied to the dispatcher before any job runs.
    pub umask: String,

    #[serde(rename = "DATA_ROOT", default, skip_serializing_if = "Option::is_none")]
    pub data_root: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Pid of the process that submitted the run; only echoed in the status
    /// stream.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub ert_pid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_environment: Option<BTreeMap<String, String>>,

    /// Values here are prepended (`value:existing`) to the named variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_update_path: Option<BTreeMap<String, String>>,

    #[serde(rename = "jobList")]
    pub job_list: Vec<JobSpec>,
}

impl Manifest {
    /// Parse the octal `umask` string.
    pub fn umask_bits(&self) -> Option<u32> {
        u32::from_str_radix(self.umask.trim(), 8)
            .ok()
            .filter(|bits| *bits <= 0o777)
    }

    pub fn job_names(&self) -> Vec<String> {
        self.job_list.iter().map(|j| j.name.clone()).collect()
    }
}

/// One step of the forward model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,

    /// Absolute path, relative path, or bare name looked up in `PATH`.
    pub executable: String,

    #[serde(rename = "argList", default, deserialize_with = "null_as_default")]
    pub arg_list: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<PathBuf>,

    /// Overlaid on the run environment at launch; later keys win.
    #[serde(default, deserialize_with = "null_as_default")]
    pub environment: BTreeMap<String, String>,

    /// Must exist before launch, otherwise the job is rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_file: Option<PathBuf>,

    /// When set, success also requires this file's mtime to advance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_file: Option<PathBuf>,

    /// When set, the file's presence after exit marks the job failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_running_minutes: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_running: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_path: Option<PathBuf>,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, executable: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            executable: executable.into(),
            arg_list: Vec::new(),
            stdin: None,
            stdout: None,
            stderr: None,
            environment: BTreeMap::new(),
            start_file: None,
            target_file: None,
            error_file: None,
            max_running_minutes: None,
            max_running: None,
            license_path: None,
        }
    }

    /// Concurrency cap for this job's license; `0` means unlimited.
    pub fn license_limit(&self) -> Option<u32> {
        self.max_running.filter(|n| *n > 0)
    }

    /// Wall-clock budget; unset, zero, negative, or too large to represent
    /// means unlimited.
    pub fn time_budget(&self) -> Option<Duration> {
        self.max_running_minutes
            .filter(|m| m.is_finite() && *m > 0.0)
            .and_then(|m| Duration::try_from_secs_f64(m * 60.0).ok())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limits_mean_unlimited() {
        let mut job = JobSpec::new("A", "/bin/true");
        job.max_running = Some(0);
        job.max_running_minutes = Some(0.0);
        assert_eq!(job.license_limit(), None);
        assert_eq!(job.time_budget(), None);

        job.max_running = Some(2);
        job.max_running_minutes = Some(0.01);
        assert_eq!(job.license_limit(), Some(2));
        let budget = job.time_budget().unwrap();
        assert!(budget.abs_diff(Duration::from_millis(600)) < Duration::from_millis(1));
    }

    #[test]
    fn unrepresentable_budget_means_unlimited() {
        let job: JobSpec = serde_json::from_str(
            r#"{"name": "LONG", "executable": "/bin/true", "max_running_minutes": 1e20}"#,
        )
        .unwrap();
        assert_eq!(job.time_budget(), None);

        let mut job = JobSpec::new("INF", "/bin/true");
        job.max_running_minutes = Some(f64::INFINITY);
        assert_eq!(job.time_budget(), None);
    }

    #[test]
    fn null_arg_list_and_environment_deserialize_as_empty() {
        let job: JobSpec = serde_json::from_str(
            r#"{"name": "A", "executable": "x", "argList": null, "environment": null}"#,
        )
        .unwrap();
        assert!(job.arg_list.is_empty());
        assert!(job.environment.is_empty());
    }

    #[test]
    fn umask_is_parsed_as_octal() {
        let m: Manifest = serde_json::from_str(r#"{"umask": "0022", "jobList": []}"#).unwrap();
        assert_eq!(m.umask_bits(), Some(0o022));

        let bad: Manifest = serde_json::from_str(r#"{"umask": "0099", "jobList": []}"#).unwrap();
        assert_eq!(bad.umask_bits(), None);
    }

    #[test]
    fn numeric_ert_pid_is_kept_as_string() {
        let m: Manifest =
            serde_json::from_str(r#"{"umask": "0000", "ert_pid": 4242, "jobList": []}"#).unwrap();
        assert_eq!(m.ert_pid.as_deref(), Some("4242"));
    }
}
