use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use jobdispatch::exec::ExecutorBackend;
use jobdispatch::manifest::JobSpec;
use jobdispatch::types::ExecutionResult;

/// A fake executor that:
/// - records which jobs were "run"
/// - returns a scripted result per job name, success by default.
pub struct FakeExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    results: HashMap<String, ExecutionResult>,
}

impl FakeExecutor {
    pub fn new(executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            executed,
            results: HashMap::new(),
        }
    }

    /// Make `job` finish with `result` instead of succeeding.
    pub fn with_result(mut self, job: &str, result: ExecutionResult) -> Self {
        self.results.insert(job.to_string(), result);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn run_job<'a>(
        &'a mut self,
        job: &'a JobSpec,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + 'a>> {
        let executed = Arc::clone(&self.executed);
        let result = self
            .results
            .get(&job.name)
            .cloned()
            .unwrap_or_else(ExecutionResult::success);

        Box::pin(async move {
            executed.lock().unwrap().push(job.name.clone());
            result
        })
    }
}
