// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{DispatchConfig, RawDispatchConfig};
use crate::errors::{DispatchError, Result};

impl TryFrom<RawDispatchConfig> for DispatchConfig {
    type Error = crate::errors::DispatchError;

    fn try_from(raw: RawDispatchConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(DispatchConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawDispatchConfig) -> Result<()> {
    validate_file_names(cfg)?;
    validate_intervals(cfg)?;
    Ok(())
}

fn validate_file_names(cfg: &RawDispatchConfig) -> Result<()> {
    let names = [
        ("status_file", &cfg.status.status_file),
        ("error_file", &cfg.status.error_file),
        ("ok_file", &cfg.status.ok_file),
    ];
    for (key, value) in names {
        if value.trim().is_empty() {
            return Err(DispatchError::ConfigError(format!(
                "[status].{key} must not be empty"
            )));
        }
    }
    Ok(())
}

fn validate_intervals(cfg: &RawDispatchConfig) -> Result<()> {
    let seconds = [
        ("[license].poll_interval_secs", cfg.license.poll_interval_secs),
        ("[target].poll_interval_secs", cfg.target.poll_interval_secs),
        ("[target].timeout_secs", cfg.target.timeout_secs),
    ];
    for (key, value) in seconds {
        if !value.is_finite() || value <= 0.0 {
            return Err(DispatchError::ConfigError(format!(
                "{key} must be > 0 (got {value})"
            )));
        }
        if Duration::try_from_secs_f64(value).is_err() {
            return Err(DispatchError::ConfigError(format!(
                "{key} is too large (got {value})"
            )));
        }
    }

    if cfg.supervisor.poll_interval_ms == 0 {
        return Err(DispatchError::ConfigError(
            "[supervisor].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_license_poll_is_rejected() {
        let mut raw = RawDispatchConfig::default();
        raw.license.poll_interval_secs = 0.0;
        match DispatchConfig::try_from(raw) {
            Err(DispatchError::ConfigError(msg)) => assert!(msg.contains("[license]")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn blank_status_file_is_rejected() {
        let mut raw = RawDispatchConfig::default();
        raw.status.status_file = "  ".to_string();
        assert!(matches!(
            DispatchConfig::try_from(raw),
            Err(DispatchError::ConfigError(_))
        ));
    }

    #[test]
    fn oversized_target_timeout_is_rejected() {
        let mut raw = RawDispatchConfig::default();
        raw.target.timeout_secs = 1e300;
        match DispatchConfig::try_from(raw) {
            Err(DispatchError::ConfigError(msg)) => {
                assert!(msg.contains("[target].timeout_secs"));
                assert!(msg.contains("too large"));
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn zero_supervisor_poll_is_rejected() {
        let mut raw = RawDispatchConfig::default();
        raw.supervisor.poll_interval_ms = 0;
        assert!(DispatchConfig::try_from(raw).is_err());
    }
}
