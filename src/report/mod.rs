// src/report/mod.rs

//! Status and error reporting for external consumers.
//!
//! Consumers (the queue driver, possibly on another host) poll the files this
//! module writes while the run is still in progress:
//!
//! - [`status`]: the ordered, append-only lifecycle event stream.
//! - [`error_record`]: one structured record per failed job, appended.
//! - [`file_reporter`]: the file-backed [`StatusSink`] used in production.

pub mod error_record;
pub mod file_reporter;
pub mod status;

pub use error_record::{ErrorRecord, StderrCapture};
pub use file_reporter::FileReporter;
pub use status::{EventKind, StatusEvent, read_status_stream};

use crate::errors::Result;

/// Destination for lifecycle events and failure records.
///
/// Every method must have made its write durable before returning, so a
/// consumer sees a consistent history even if the dispatcher dies right
/// after.
pub trait StatusSink: Send {
    fn emit(&mut self, event: &StatusEvent) -> Result<()>;

    fn record_error(&mut self, record: &ErrorRecord) -> Result<()>;

    /// Called once when every selected job succeeded.
    fn mark_success(&mut self) -> Result<()>;
}
