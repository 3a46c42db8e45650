// src/engine/selection.rs

use thiserror::Error;

use crate::manifest::JobSpec;

/// Some requested job names are not in the manifest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{missing:?} does not exist. Available jobs: {available:?}")]
pub struct UnknownJobs {
    pub missing: Vec<String>,
    pub available: Vec<String>,
}

/// Jobs to run, in manifest order.
///
/// An empty `names` selects every job. Otherwise every manifest job whose
/// name is listed is selected (duplicate names in the manifest are all
/// kept), and any listed name that matches nothing is an error.
pub fn select_jobs<'a>(jobs: &'a [JobSpec], names: &[String]) -> Result<Vec<&'a JobSpec>, UnknownJobs> {
    if names.is_empty() {
        return Ok(jobs.iter().collect());
    }

    let selected: Vec<&JobSpec> = jobs.iter().filter(|j| names.contains(&j.name)).collect();

    let mut missing: Vec<String> = names
        .iter()
        .filter(|n| !jobs.iter().any(|j| &j.name == *n))
        .cloned()
        .collect();
    missing.dedup();

    if missing.is_empty() {
        Ok(selected)
    } else {
        Err(UnknownJobs {
            missing,
            available: jobs.iter().map(|j| j.name.clone()).collect(),
        })
    }
}
