// tests/license_concurrency.rs

use std::error::Error;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use jobdispatch::config::DispatchConfig;
use jobdispatch::exec::{ExecutorBackend, RealExecutorBackend};
use jobdispatch::license::{LicenseGate, leases_in_use};
use jobdispatch::manifest::JobEnvironment;
use jobdispatch_test_utils::builders::JobSpecBuilder;
use jobdispatch_test_utils::{init_tracing, with_timeout, write_script};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn no_more_than_max_running_holders_at_once() -> TestResult {
    init_tracing();
    let licenses = tempfile::tempdir()?;
    let limit = 2;
    let job = JobSpecBuilder::new("ECLIPSE", "/bin/true")
        .license(licenses.path(), limit)
        .build();

    let holders = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let mut tasks = Vec::new();

    for _ in 0..=limit {
        let job = job.clone();
        let holders = Arc::clone(&holders);
        let peak = Arc::clone(&peak);
        tasks.push(tokio::spawn(async move {
            let gate = LicenseGate::new(Duration::from_millis(20));
            let mut lease = gate.acquire(&job).await.unwrap();
            let now = holders.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(150)).await;
            holders.fetch_sub(1, Ordering::SeqCst);
            lease.release();
        }));
    }

    with_timeout(async {
        for task in tasks {
            task.await.unwrap();
        }
    })
    .await;

    assert!(peak.load(Ordering::SeqCst) <= limit as usize);
    assert_eq!(leases_in_use(&licenses.path().join("ECLIPSE"))?, 0);
    Ok(())
}

#[tokio::test]
async fn dispatched_job_holds_license_only_while_running() -> TestResult {
    let run = tempfile::tempdir()?;
    let licenses = tempfile::tempdir()?;
    let backing = licenses.path().join("COUNT");

    let script = write_script(
        run.path(),
        "count.sh",
        &format!("stat -c %h '{}' > links.txt", backing.display()),
    );
    let job = JobSpecBuilder::new("COUNT", &script)
        .license(licenses.path(), 1)
        .build();

    let env = JobEnvironment::from_vars([("PATH", "/usr/bin:/bin")]);
    let mut backend = RealExecutorBackend::new(run.path(), env, &DispatchConfig::default());
    let result = backend.run_job(&job).await;

    assert!(result.success, "{}", result.message);
    // Backing file plus the job's own lease link.
    assert_eq!(fs::read_to_string(run.path().join("links.txt"))?.trim(), "2");
    assert_eq!(leases_in_use(&backing)?, 0);
    Ok(())
}

#[tokio::test]
async fn unlimited_jobs_never_touch_the_license_dir() -> TestResult {
    let licenses = tempfile::tempdir()?;
    let job = JobSpecBuilder::new("FREE", "/bin/true")
        .license(licenses.path(), 0)
        .build();

    let lease = LicenseGate::new(Duration::from_millis(20)).acquire(&job).await?;
    assert!(lease.path().is_none());
    assert_eq!(fs::read_dir(licenses.path())?.count(), 0);
    Ok(())
}
