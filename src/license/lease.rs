// src/license/lease.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// One held license slot: a hard link inside the license directory.
///
/// Releasing removes the link. It is safe to release more than once, or
/// after the link was removed by someone else. Dropping a lease releases it,
/// so every exit path of a job gives its slot back.
#[derive(Debug, Default)]
pub struct LicenseLease {
    link: Option<PathBuf>,
}

impl LicenseLease {
    /// Lease for a job without a concurrency cap; releasing does nothing.
    pub fn empty() -> Self {
        Self { link: None }
    }

    pub(crate) fn held(link: PathBuf) -> Self {
        Self { link: Some(link) }
    }

    pub fn path(&self) -> Option<&Path> {
        self.link.as_deref()
    }

    pub fn release(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };
        match fs::remove_file(&link) {
            Ok(()) => debug!(lease = %link.display(), "license released"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(lease = %link.display(), "license link already gone");
            }
            Err(e) => warn!(lease = %link.display(), error = %e, "failed to remove license link"),
        }
    }
}

impl Drop for LicenseLease {
    fn drop(&mut self) {
        self.release();
    }
}
