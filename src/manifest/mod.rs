// src/manifest/mod.rs

//! The job manifest (`jobs.json`) written by the upstream planner.
//!
//! - [`model`] holds the serde data model (`Manifest`, `JobSpec`).
//! - [`loader`] reads and sanity-checks the JSON document.
//! - [`environment`] turns the manifest's global environment settings into
//!   an explicit [`JobEnvironment`] map handed to every launch.

pub mod environment;
pub mod loader;
pub mod model;

pub use environment::JobEnvironment;
pub use loader::{load_manifest, parse_manifest};
pub use model::{JobSpec, Manifest};
