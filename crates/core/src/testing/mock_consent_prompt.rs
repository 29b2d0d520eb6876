//! Mock consent prompt for testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::update::{ConsentPrompt, ConsentRequest};

/// Mock implementation of the ConsentPrompt trait.
///
/// Keeps every request so tests can inspect the dialog texts and answer it
/// through the attached reply handle.
#[derive(Debug, Default)]
pub struct MockConsentPrompt {
    pending: Mutex<VecDeque<ConsentRequest>>,
    requested: Mutex<u32>,
}

impl MockConsentPrompt {
    /// Create a new mock prompt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of dialogs requested.
    pub fn request_count(&self) -> u32 {
        *self.requested.lock().unwrap()
    }

    /// Oldest unanswered request, if any.
    pub fn take_request(&self) -> Option<ConsentRequest> {
        self.pending.lock().unwrap().pop_front()
    }
}

impl ConsentPrompt for MockConsentPrompt {
    fn request_consent(&self, request: ConsentRequest) {
        *self.requested.lock().unwrap() += 1;
        self.pending.lock().unwrap().push_back(request);
    }
}
