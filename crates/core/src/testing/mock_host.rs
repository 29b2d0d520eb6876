//! Mock procedure host for testing.

use std::sync::Mutex;

use crate::update::{CompletionReport, ProcedureHost};

/// Mock implementation of the ProcedureHost trait.
///
/// Records every advance and shutdown request for assertions.
#[derive(Debug, Default)]
pub struct MockHost {
    advances: Mutex<Vec<CompletionReport>>,
    shutdowns: Mutex<u32>,
}

impl MockHost {
    /// Create a new mock host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received through `advance`, oldest first.
    pub fn advances(&self) -> Vec<CompletionReport> {
        self.advances.lock().unwrap().clone()
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_count() > 0
    }

    pub fn shutdown_count(&self) -> u32 {
        *self.shutdowns.lock().unwrap()
    }
}

impl ProcedureHost for MockHost {
    fn advance(&self, report: &CompletionReport) {
        self.advances.lock().unwrap().push(report.clone());
    }

    fn request_shutdown(&self) {
        *self.shutdowns.lock().unwrap() += 1;
    }
}
