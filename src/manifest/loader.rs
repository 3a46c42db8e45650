// src/manifest/loader.rs

use std::fs;
use std::path::Path;

use crate::errors::{DispatchError, Result};
use crate::manifest::model::Manifest;

/// Read and validate a manifest file.
///
/// Every failure (unreadable file, malformed JSON, missing `umask` or
/// `jobList`, invalid umask) is reported as [`DispatchError::ManifestError`]
/// so the caller can tell manifest problems apart from runtime IO failures.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Manifest> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        DispatchError::ManifestError(format!("failed to read {}: {e}", path.display()))
    })?;
    parse_manifest(&contents)
}

/// Parse and validate manifest JSON.
pub fn parse_manifest(contents: &str) -> Result<Manifest> {
    let manifest: Manifest = serde_json::from_str(contents)
        .map_err(|e| DispatchError::ManifestError(format!("failed to load JSON: {e}")))?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

fn validate_manifest(manifest: &Manifest) -> Result<()> {
    if manifest.umask_bits().is_none() {
        return Err(DispatchError::ManifestError(format!(
            "umask '{}' is not a valid octal mode",
            manifest.umask
        )));
    }

    for (index, job) in manifest.job_list.iter().enumerate() {
        if job.name.trim().is_empty() {
            return Err(DispatchError::ManifestError(format!(
                "job #{index} has an empty name"
            )));
        }
        if job.executable.trim().is_empty() {
            return Err(DispatchError::ManifestError(format!(
                "job '{}' has an empty executable",
                job.name
            )));
        }
        if job.license_limit().is_some() && job.license_path.is_none() {
            return Err(DispatchError::ManifestError(format!(
                "job '{}' sets max_running but no license_path",
                job.name
            )));
        }
    }
    Ok(())
}
