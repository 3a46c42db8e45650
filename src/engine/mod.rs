// src/engine/mod.rs

//! Runner loop for jobdispatch.
//!
//! - [`selection`] picks the jobs to run from the manifest (all of them, or a
//!   named subset in manifest order).
//! - [`runtime`] executes the selection strictly in order through an
//!   [`ExecutorBackend`](crate::exec::ExecutorBackend), reporting every step
//!   to a [`StatusSink`](crate::report::StatusSink) and stopping at the first
//!   failed job.

pub mod runtime;
pub mod selection;

pub use runtime::{RunOutcome, Runner};
pub use selection::{UnknownJobs, select_jobs};
