// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{DispatchConfig, RawDispatchConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw config.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawDispatchConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawDispatchConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<DispatchConfig> {
    let raw_config = load_from_path(&path)?;
    let config = DispatchConfig::try_from(raw_config)?;
    Ok(config)
}

/// Load the config at `path` if the file exists, otherwise use defaults.
///
/// The dispatcher normally runs without any config file; one is only
/// needed to rename the status files or tune poll intervals.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<DispatchConfig> {
    let path = path.as_ref();
    if path.is_file() {
        debug!(path = %path.display(), "loading dispatcher config");
        load_and_validate(path)
    } else {
        debug!(path = %path.display(), "no dispatcher config file; using defaults");
        Ok(DispatchConfig::default())
    }
}

/// Default config location, relative to the run path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dispatch.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load_or_default("does/not/exist/Dispatch.toml").unwrap();
        assert_eq!(cfg.status.status_file, "STATUS");
        assert_eq!(cfg.status.legacy_exit_file.as_deref(), Some("EXIT"));
        assert_eq!(cfg.license.poll_interval_secs, 5.0);
        assert_eq!(cfg.target.timeout_secs, 60.0);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let raw: RawDispatchConfig = toml::from_str(
            r#"
[target]
timeout_secs = 2.5
"#,
        )
        .unwrap();
        let cfg = DispatchConfig::try_from(raw).unwrap();
        assert_eq!(cfg.target.timeout_secs, 2.5);
        assert_eq!(cfg.target.poll_interval_secs, 1.0);
        assert_eq!(cfg.supervisor.poll_interval_ms, 500);
    }
}
