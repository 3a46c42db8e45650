// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [status]
/// status_file = "STATUS"
/// error_file = "ERROR"
/// ok_file = "OK"
/// legacy_exit_file = "EXIT"
///
/// [license]
/// poll_interval_secs = 5.0
///
/// [target]
/// poll_interval_secs = 1.0
/// timeout_secs = 60.0
///
/// [supervisor]
/// poll_interval_ms = 500
/// ```
///
/// All sections are optional and have defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawDispatchConfig {
    #[serde(default)]
    pub status: StatusSection,

    #[serde(default)]
    pub license: LicenseSection,

    #[serde(default)]
    pub target: TargetSection,

    #[serde(default)]
    pub supervisor: SupervisorSection,
}

/// Validated configuration. Construct through `TryFrom<RawDispatchConfig>`.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub status: StatusSection,
    pub license: LicenseSection,
    pub target: TargetSection,
    pub supervisor: SupervisorSection,
}

impl DispatchConfig {
    pub(crate) fn new_unchecked(raw: RawDispatchConfig) -> Self {
        Self {
            status: raw.status,
            license: raw.license,
            target: raw.target,
            supervisor: raw.supervisor,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::new_unchecked(RawDispatchConfig::default())
    }
}

/// `[status]` section: names of the files written for external consumers,
/// relative to the run path.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusSection {
    #[serde(default = "default_status_file")]
    pub status_file: String,

    #[serde(default = "default_error_file")]
    pub error_file: String,

    #[serde(default = "default_ok_file")]
    pub ok_file: String,

    /// Older queue drivers read failures from `EXIT`; when set, the error
    /// file is copied here after every append.
    #[serde(default = "default_legacy_exit_file")]
    pub legacy_exit_file: Option<String>,
}

fn default_status_file() -> String {
    "STATUS".to_string()
}

fn default_error_file() -> String {
    "ERROR".to_string()
}

fn default_ok_file() -> String {
    "OK".to_string()
}

fn default_legacy_exit_file() -> Option<String> {
    Some("EXIT".to_string())
}

impl Default for StatusSection {
    fn default() -> Self {
        Self {
            status_file: default_status_file(),
            error_file: default_error_file(),
            ok_file: default_ok_file(),
            legacy_exit_file: default_legacy_exit_file(),
        }
    }
}

/// `[license]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LicenseSection {
    /// Backoff between link-count polls while waiting for a free slot.
    #[serde(default = "default_license_poll")]
    pub poll_interval_secs: f64,
}

fn default_license_poll() -> f64 {
    5.0
}

impl Default for LicenseSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_license_poll(),
        }
    }
}

impl LicenseSection {
    pub fn poll_interval(&self) -> Duration {
        seconds_or(self.poll_interval_secs, default_license_poll())
    }
}

/// `[target]` section: how long to wait for a target file to be updated
/// after the job exits.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSection {
    #[serde(default = "default_target_poll")]
    pub poll_interval_secs: f64,

    #[serde(default = "default_target_timeout")]
    pub timeout_secs: f64,
}

fn default_target_poll() -> f64 {
    1.0
}

fn default_target_timeout() -> f64 {
    60.0
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_target_poll(),
            timeout_secs: default_target_timeout(),
        }
    }
}

impl TargetSection {
    pub fn poll_interval(&self) -> Duration {
        seconds_or(self.poll_interval_secs, default_target_poll())
    }

    pub fn timeout(&self) -> Duration {
        seconds_or(self.timeout_secs, default_target_timeout())
    }
}

/// `[supervisor]` section: liveness poll of the timeout supervisor.
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorSection {
    #[serde(default = "default_supervisor_poll")]
    pub poll_interval_ms: u64,
}

fn default_supervisor_poll() -> u64 {
    500
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_supervisor_poll(),
        }
    }
}

impl SupervisorSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// `secs` as a `Duration`, or `fallback` seconds when `secs` is not a
/// positive value `Duration` can hold. Validated configs never fall back.
fn seconds_or(secs: f64, fallback: f64) -> Duration {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or_else(|| Duration::from_secs_f64(fallback))
}
