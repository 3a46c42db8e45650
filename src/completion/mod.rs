// src/completion/mod.rs

//! Deciding whether a finished job passed.
//!
//! - [`target`] captures the target-file reference mtime before launch and
//!   waits for it to advance afterwards.
//! - [`evaluator`] combines the exit code with the target-file and
//!   error-file signals.

pub mod evaluator;
pub mod target;

pub use evaluator::evaluate;
pub use target::{TargetReference, TargetWait, wait_for_target};
