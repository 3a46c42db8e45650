// src/manifest/environment.rs

//! Explicit environment handed to every job.
//!
//! The dispatcher never mutates its own process environment. The manifest's
//! `DATA_ROOT`, `run_id`, `global_environment` and `global_update_path` are
//! folded into a [`JobEnvironment`] once at startup, and each launch overlays
//! the job's own `environment` on a copy of it.

use std::collections::BTreeMap;

use crate::manifest::model::Manifest;

pub const DATA_ROOT_VAR: &str = "DATA_ROOT";
pub const RUN_ID_VAR: &str = "ERT_RUN_ID";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobEnvironment {
    vars: BTreeMap<String, String>,
}

impl JobEnvironment {
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Snapshot of the dispatcher's environment. Non-UTF-8 entries are
    /// skipped.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    /// Apply the manifest's global settings on top of `base`.
    pub fn for_manifest(base: JobEnvironment, manifest: &Manifest) -> Self {
        let mut env = base;

        if let Some(root) = &manifest.data_root {
            env.set(DATA_ROOT_VAR, root);
        }
        if let Some(run_id) = &manifest.run_id {
            env.set(RUN_ID_VAR, run_id);
        }
        if let Some(globals) = &manifest.global_environment {
            for (key, value) in globals {
                env.set(key, value);
            }
        }
        if let Some(updates) = &manifest.global_update_path {
            for (key, value) in updates {
                env.prepend(key, value);
            }
        }

        env
    }

    /// Copy with `overrides` applied; overrides win on conflict.
    pub fn overlay(&self, overrides: &BTreeMap<String, String>) -> Self {
        let mut env = self.clone();
        for (key, value) in overrides {
            env.set(key, value);
        }
        env
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    /// `value:existing`, or just `value` when the variable is unset or empty.
    pub fn prepend(&mut self, key: &str, value: &str) {
        let updated = match self.vars.get(key) {
            Some(existing) if !existing.is_empty() => format!("{value}:{existing}"),
            _ => value.to_string(),
        };
        self.vars.insert(key.to_string(), updated);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
