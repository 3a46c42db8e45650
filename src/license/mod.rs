// src/license/mod.rs

//! Filesystem-backed counting semaphore ("license") shared between
//! independent dispatcher processes.
//!
//! Each limited job name owns a backing file `license_path/<name>`. Every
//! running instance holds one extra hard link to it, named by a random
//! six-digit id, so the number of instances in use is `nlink - 1`. Link
//! creation and removal are atomic on the shared filesystem, which is the
//! only coordination primitive relied upon.
//!
//! There is no fairness: waiters poll, and a brief overshoot after a racing
//! link is tolerated by waiting rather than rolling the link back.

pub mod lease;

pub use lease::LicenseLease;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};

use crate::manifest::JobSpec;

/// Lease ids are drawn from this range (900,000 values).
const LEASE_ID_RANGE: std::ops::RangeInclusive<u32> = 100_000..=999_999;

#[derive(Debug, Clone)]
pub struct LicenseGate {
    poll_interval: Duration,
}

impl LicenseGate {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Block until a slot is free for `job`, then hold it.
    ///
    /// Returns an empty lease when the job has no `max_running` cap. IO
    /// errors on the backing file or the link are returned to the caller.
    pub async fn acquire(&self, job: &JobSpec) -> io::Result<LicenseLease> {
        let (limit, dir) = match (job.license_limit(), job.license_path.as_deref()) {
            (Some(limit), Some(dir)) => (limit, dir),
            _ => return Ok(LicenseLease::empty()),
        };

        let backing = ensure_backing_file(dir, &job.name)?;
        let limit = u64::from(limit);

        let mut announced = false;
        loop {
            let in_use = leases_in_use(&backing)?;
            if in_use < limit {
                break;
            }
            if !announced {
                info!(job = %job.name, in_use, limit, "license limit reached; waiting for a free slot");
                announced = true;
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        let lease = LicenseLease::held(link_lease(&backing, || unused_lease_path(dir))?);
        self.settle_after_link(&backing, limit, &job.name).await?;

        debug!(job = %job.name, lease = ?lease.path(), "license acquired");
        Ok(lease)
    }

    /// Another process may have linked between our poll and our link. Wait
    /// for the count to come back under the cap instead of unlinking.
    async fn settle_after_link(&self, backing: &Path, limit: u64, job: &str) -> io::Result<()> {
        loop {
            let in_use = leases_in_use(backing)?;
            if in_use <= limit {
                return Ok(());
            }
            debug!(job, in_use, limit, "license overshoot after link; waiting");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Hard-link `backing` at the first free path `candidate` yields. A name
/// taken since it was generated is skipped.
fn link_lease(backing: &Path, mut candidate: impl FnMut() -> PathBuf) -> io::Result<PathBuf> {
    loop {
        let link = candidate();
        match fs::hard_link(backing, &link) {
            Ok(()) => return Ok(link),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(lease = %link.display(), "lease id taken; drawing another");
            }
            Err(e) => return Err(e),
        }
    }
}

/// Number of leases currently linked to `backing`.
pub fn leases_in_use(backing: &Path) -> io::Result<u64> {
    let meta = fs::metadata(backing)?;
    Ok(meta.nlink().saturating_sub(1))
}

/// Create `dir/<name>` if it does not exist yet. A fresh file has one link,
/// meaning zero leases held.
fn ensure_backing_file(dir: &Path, name: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let backing = dir.join(name);
    match OpenOptions::new().write(true).create_new(true).open(&backing) {
        Ok(mut file) => {
            writeln!(file, "This is a license file for job:{name}")?;
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e),
    }
    Ok(backing)
}

fn unused_lease_path(dir: &Path) -> PathBuf {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = dir.join(rng.gen_range(LEASE_ID_RANGE).to_string());
        if !candidate.exists() {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limited_job(dir: &Path, limit: u32) -> JobSpec {
        let mut job = JobSpec::new("ECLIPSE", "/bin/true");
        job.max_running = Some(limit);
        job.license_path = Some(dir.to_path_buf());
        job
    }

    #[tokio::test]
    async fn unlimited_job_gets_empty_lease() {
        let gate = LicenseGate::new(Duration::from_millis(10));
        let lease = gate.acquire(&JobSpec::new("A", "/bin/true")).await.unwrap();
        assert!(lease.path().is_none());
    }

    #[tokio::test]
    async fn backing_file_counts_links() {
        let dir = tempfile::tempdir().unwrap();
        let gate = LicenseGate::new(Duration::from_millis(10));
        let job = limited_job(dir.path(), 2);

        let mut first = gate.acquire(&job).await.unwrap();
        let backing = dir.path().join("ECLIPSE");
        assert_eq!(leases_in_use(&backing).unwrap(), 1);

        let second = gate.acquire(&job).await.unwrap();
        assert_eq!(leases_in_use(&backing).unwrap(), 2);
        assert_ne!(first.path(), second.path());

        first.release();
        assert_eq!(leases_in_use(&backing).unwrap(), 1);
        drop(second);
        assert_eq!(leases_in_use(&backing).unwrap(), 0);
    }

    #[tokio::test]
    async fn overshoot_after_link_waits_for_count_to_drop() {
        let dir = tempfile::tempdir().unwrap();
        let backing = ensure_backing_file(dir.path(), "ECLIPSE").unwrap();
        // Our own link plus a racer's: two in use against a cap of one.
        fs::hard_link(&backing, dir.path().join("111111")).unwrap();
        fs::hard_link(&backing, dir.path().join("222222")).unwrap();

        let gate = LicenseGate::new(Duration::from_millis(10));
        let waiting = tokio::spawn({
            let backing = backing.clone();
            async move { gate.settle_after_link(&backing, 1, "ECLIPSE").await }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiting.is_finished());
        assert_eq!(leases_in_use(&backing).unwrap(), 2);

        fs::remove_file(dir.path().join("222222")).unwrap();
        tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .expect("settle did not return after the racer released")
            .unwrap()
            .unwrap();
        assert_eq!(leases_in_use(&backing).unwrap(), 1);
    }

    #[test]
    fn taken_lease_id_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let backing = ensure_backing_file(dir.path(), "ECLIPSE").unwrap();
        let taken = dir.path().join("123456");
        fs::write(&taken, "someone else's").unwrap();
        let free = dir.path().join("654321");

        let mut candidates = vec![taken.clone(), free.clone()].into_iter();
        let link = link_lease(&backing, || candidates.next().unwrap()).unwrap();

        assert_eq!(link, free);
        assert_eq!(fs::read_to_string(&taken).unwrap(), "someone else's");
        assert_eq!(leases_in_use(&backing).unwrap(), 1);
    }

    #[test]
    fn lease_ids_are_six_digits() {
        let dir = tempfile::tempdir().unwrap();
        let path = unused_lease_path(dir.path());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name.len(), 6);
        assert!(name.chars().all(|c| c.is_ascii_digit()));
    }
}
