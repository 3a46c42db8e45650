use std::sync::{Arc, Mutex};

use jobdispatch::errors::Result;
use jobdispatch::report::{ErrorRecord, StatusEvent, StatusSink};

/// Everything a [`MemoryReporter`] has been told.
#[derive(Debug, Default)]
pub struct Recorded {
    pub events: Vec<StatusEvent>,
    pub errors: Vec<ErrorRecord>,
    pub marked_success: bool,
}

/// In-memory `StatusSink`; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    inner: Arc<Mutex<Recorded>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.inner.lock().unwrap().errors.clone()
    }

    pub fn marked_success(&self) -> bool {
        self.inner.lock().unwrap().marked_success
    }
}

impl StatusSink for MemoryReporter {
    fn emit(&mut self, event: &StatusEvent) -> Result<()> {
        self.inner.lock().unwrap().events.push(event.clone());
        Ok(())
    }

    fn record_error(&mut self, record: &ErrorRecord) -> Result<()> {
        self.inner.lock().unwrap().errors.push(record.clone());
        Ok(())
    }

    fn mark_success(&mut self) -> Result<()> {
        self.inner.lock().unwrap().marked_success = true;
        Ok(())
    }
}
