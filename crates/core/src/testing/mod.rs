//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the orchestrator's
//! collaborators, allowing the whole update flow to be exercised without a
//! real transport, dialog or host.
//!
//! # Example
//!
//! ```rust,ignore
//! use updraft_core::testing::{fixtures, MockConsentPrompt, MockHost, MockTransport};
//!
//! let transport = Arc::new(MockTransport::new());
//! let prompt = Arc::new(MockConsentPrompt::new());
//! let host = Arc::new(MockHost::new());
//!
//! // Build an orchestrator with these, enter it, then drive the transport
//! transport.publish(fixtures::check_complete_event(2, 2048));
//! transport.publish_all(fixtures::successful_download("a", 1024));
//! ```

mod mock_consent_prompt;
mod mock_host;
mod mock_transport;

pub use mock_consent_prompt::MockConsentPrompt;
pub use mock_host::MockHost;
pub use mock_transport::MockTransport;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::update::{
        CheckComplete, UpdateChanged, UpdateEvent, UpdateFailure, UpdateStart, UpdateSuccess,
    };

    /// Check result for `count` resources totalling `zip_length` compressed bytes.
    ///
    /// The uncompressed total is twice the compressed one.
    pub fn check_complete(count: u32, zip_length: u64) -> CheckComplete {
        CheckComplete {
            update_count: count,
            update_total_zip_length: zip_length,
            update_total_length: zip_length * 2,
        }
    }

    pub fn start(name: &str) -> UpdateStart {
        UpdateStart {
            name: name.to_string(),
        }
    }

    pub fn changed(name: &str, current_length: u64) -> UpdateChanged {
        UpdateChanged {
            name: name.to_string(),
            current_length,
        }
    }

    pub fn success(name: &str, zip_length: u64) -> UpdateSuccess {
        UpdateSuccess {
            name: name.to_string(),
            zip_length,
        }
    }

    /// Failed attempt `retry_count` out of `total_retry_count`.
    pub fn failure(name: &str, retry_count: u32, total_retry_count: u32) -> UpdateFailure {
        UpdateFailure {
            name: name.to_string(),
            download_uri: format!("https://cdn.example.com/resources/{}", name),
            error_message: "connection reset".to_string(),
            retry_count,
            total_retry_count,
        }
    }

    pub fn check_complete_event(count: u32, zip_length: u64) -> UpdateEvent {
        UpdateEvent::CheckComplete(check_complete(count, zip_length))
    }

    pub fn start_event(name: &str) -> UpdateEvent {
        UpdateEvent::UpdateStart(start(name))
    }

    pub fn changed_event(name: &str, current_length: u64) -> UpdateEvent {
        UpdateEvent::UpdateChanged(changed(name, current_length))
    }

    pub fn success_event(name: &str, zip_length: u64) -> UpdateEvent {
        UpdateEvent::UpdateSuccess(success(name, zip_length))
    }

    pub fn failure_event(name: &str, retry_count: u32, total_retry_count: u32) -> UpdateEvent {
        UpdateEvent::UpdateFailure(failure(name, retry_count, total_retry_count))
    }

    pub fn all_complete_event() -> UpdateEvent {
        UpdateEvent::UpdateAllComplete
    }

    /// Start, halfway progress, then success for one resource.
    pub fn successful_download(name: &str, zip_length: u64) -> Vec<UpdateEvent> {
        vec![
            start_event(name),
            changed_event(name, zip_length / 2),
            success_event(name, zip_length),
        ]
    }
}
