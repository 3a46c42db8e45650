// src/config/mod.rs

//! Runner-level configuration for jobdispatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, falling back to defaults (`loader.rs`).
//! - Validate intervals and file names (`validate.rs`).
//!
//! This is distinct from the job manifest (`jobs.json`), which lives in
//! [`crate::manifest`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    DispatchConfig, LicenseSection, RawDispatchConfig, StatusSection, SupervisorSection,
    TargetSection,
};
