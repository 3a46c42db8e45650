// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`launcher`] resolves the executable, sets up redirection and the
//!   environment, and spawns the job as a process-group leader.
//! - [`redirect`] owns the stale-vs-resumed output file policy.
//! - [`supervisor`] enforces the wall-clock budget by killing the process
//!   group.
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `RealExecutorBackend` the runner uses in production, and which tests can
//!   replace with a fake implementation.

pub mod backend;
pub mod launcher;
pub mod redirect;
pub mod supervisor;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use launcher::{ProcessHandle, launch, resolve_executable};
pub use supervisor::{Supervision, kill_process_group, supervise};
