//! State accumulated over one update run.
//!
//! The session never calls collaborators itself. Every handler returns the
//! [`Directive`] the owner has to carry out, which keeps the state machine
//! inspectable and testable without side effects.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::metrics;

use super::events::{CheckComplete, UpdateChanged, UpdateFailure, UpdateStart, UpdateSuccess};
use super::gate::{GateDecision, NetworkPolicyGate};
use super::tracker::{ResourceTracker, StartOutcome};
use super::types::{CompletionReport, Directive, SessionSnapshot, SessionState};

/// Update progress for a single run of the orchestrator.
#[derive(Debug)]
pub struct UpdateSession {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    state: SessionState,
    gate: NetworkPolicyGate,
    gate_evaluations: u32,
    total_item_count: u32,
    total_zip_bytes: u64,
    total_bytes: u64,
    success_count: u32,
    transient_failures: u32,
    failed_resources: Vec<String>,
    all_complete: bool,
    tracker: ResourceTracker,
}

impl UpdateSession {
    /// Create an idle session.
    pub fn new(gate: NetworkPolicyGate) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            state: SessionState::Idle,
            gate,
            gate_evaluations: 0,
            total_item_count: 0,
            total_zip_bytes: 0,
            total_bytes: 0,
            success_count: 0,
            transient_failures: 0,
            failed_resources: Vec::new(),
            all_complete: false,
            tracker: ResourceTracker::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True once every resource is up to date.
    pub fn is_complete(&self) -> bool {
        self.all_complete
    }

    pub fn total_item_count(&self) -> u32 {
        self.total_item_count
    }

    pub fn total_zip_bytes(&self) -> u64 {
        self.total_zip_bytes
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    pub fn transient_failures(&self) -> u32 {
        self.transient_failures
    }

    pub fn failed_resources(&self) -> &[String] {
        &self.failed_resources
    }

    /// How many times the network policy was consulted.
    pub fn gate_evaluations(&self) -> u32 {
        self.gate_evaluations
    }

    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    /// Start the run: Idle -> Checking.
    pub fn begin(&mut self) -> Option<Directive> {
        if self.state != SessionState::Idle {
            self.anomaly("unexpected_event", "begin", None);
            return None;
        }
        info!("Update session {} checking resources", self.session_id);
        self.state = SessionState::Checking;
        Some(Directive::BeginCheck)
    }

    pub fn on_check_complete(&mut self, event: &CheckComplete) -> Option<Directive> {
        if self.state != SessionState::Checking {
            self.anomaly("unexpected_event", "check_complete", None);
            return None;
        }

        info!(
            "Check resource complete, '{}' resources need to update, zip length is '{}', unzip length is '{}'",
            event.update_count, event.update_total_zip_length, event.update_total_length
        );

        self.total_item_count = event.update_count;
        self.total_zip_bytes = event.update_total_zip_length;
        self.total_bytes = event.update_total_length;

        if self.total_item_count == 0 {
            self.mark_all_complete();
            return None;
        }

        self.gate_evaluations += 1;
        match self.gate.evaluate() {
            GateDecision::Proceed => {
                self.state = SessionState::Downloading;
                Some(Directive::BeginDownload)
            }
            GateDecision::RequireConsent(pending) => {
                self.state = SessionState::AwaitingConsent(pending);
                Some(Directive::RequestConsent)
            }
        }
    }

    pub fn on_update_start(&mut self, event: &UpdateStart) {
        if !self.accepts_item_event("update_start", &event.name) {
            return;
        }

        if self.tracker.start(&event.name) == StartOutcome::Restarted {
            self.anomaly("duplicate_start", "update_start", Some(&event.name));
        } else {
            debug!("Update resource '{}' started", event.name);
        }
    }

    pub fn on_update_changed(&mut self, event: &UpdateChanged) {
        if !self.accepts_item_event("update_changed", &event.name) {
            return;
        }

        if !self.tracker.update_length(&event.name, event.current_length) {
            self.anomaly("unknown_resource", "update_changed", Some(&event.name));
        }
    }

    pub fn on_update_success(&mut self, event: &UpdateSuccess) {
        if !self.accepts_item_event("update_success", &event.name) {
            return;
        }

        if !self.tracker.mark_success(&event.name, event.zip_length) {
            self.anomaly("unknown_resource", "update_success", Some(&event.name));
            return;
        }

        if self.success_count < self.total_item_count {
            self.success_count += 1;
            metrics::RESOURCE_UPDATES
                .with_label_values(&["success"])
                .inc();
            info!(
                "Update resource '{}' success ({}/{})",
                event.name, self.success_count, self.total_item_count
            );
        } else {
            warn!(
                "Update resource '{}' succeeded beyond the announced {} resources",
                event.name, self.total_item_count
            );
            metrics::PROTOCOL_ANOMALIES
                .with_label_values(&["unexpected_event"])
                .inc();
        }
    }

    pub fn on_update_failure(&mut self, event: &UpdateFailure) {
        if !self.accepts_item_event("update_failure", &event.name) {
            return;
        }

        if event.is_exhausted() {
            error!(
                "Update resource '{}' failure from '{}' with error message '{}', retry count '{}'",
                event.name, event.download_uri, event.error_message, event.retry_count
            );
            metrics::RESOURCE_UPDATES
                .with_label_values(&["exhausted"])
                .inc();
            if !self.failed_resources.contains(&event.name) {
                self.failed_resources.push(event.name.clone());
            }
        } else {
            info!(
                "Update resource '{}' failure from '{}' with error message '{}', retry count '{}'",
                event.name, event.download_uri, event.error_message, event.retry_count
            );
            metrics::RESOURCE_UPDATES.with_label_values(&["retry"]).inc();
            self.transient_failures += 1;
        }

        if self.tracker.remove(&event.name).is_none() {
            self.anomaly("unknown_resource", "update_failure", Some(&event.name));
        }
    }

    pub fn on_update_all_complete(&mut self) {
        match self.state {
            SessionState::Downloading => {
                info!("All resources update complete");
                if !self.failed_resources.is_empty() {
                    warn!(
                        "Update session {} finished with {} failed resources: {:?}",
                        self.session_id,
                        self.failed_resources.len(),
                        self.failed_resources
                    );
                }
                self.mark_all_complete();
            }
            SessionState::Complete => {
                debug!("Repeated all-complete notification ignored");
            }
            SessionState::Cancelled => {
                debug!("All-complete notification after cancellation ignored");
            }
            _ => self.anomaly("unexpected_event", "update_all_complete", None),
        }
    }

    /// Apply the user's answer to a pending consent request.
    ///
    /// Returns `None` if nothing was pending.
    pub fn resolve_consent(&mut self, confirmed: bool) -> Option<Directive> {
        let SessionState::AwaitingConsent(pending) = self.state else {
            warn!(
                "Consent answer received in state '{}', ignoring",
                self.state.as_str()
            );
            return None;
        };

        let action = if confirmed {
            metrics::CONSENT_PROMPTS
                .with_label_values(&["confirmed"])
                .inc();
            pending.on_confirm
        } else {
            metrics::CONSENT_PROMPTS
                .with_label_values(&["declined"])
                .inc();
            pending.on_cancel
        };

        let directive = Directive::from(action);
        self.state = match directive {
            Directive::BeginDownload => SessionState::Downloading,
            _ => SessionState::Cancelled,
        };
        info!(
            "Download consent {} for session {}",
            if confirmed { "given" } else { "declined" },
            self.session_id
        );
        Some(directive)
    }

    /// Read-only view for UI and telemetry.
    pub fn snapshot(&self) -> SessionSnapshot {
        let transferred_bytes = self.tracker.transferred_bytes();
        let progress = if self.total_zip_bytes == 0 {
            0.0
        } else {
            (transferred_bytes as f64 / self.total_zip_bytes as f64).min(1.0)
        };

        SessionSnapshot {
            session_id: self.session_id,
            started_at: self.started_at,
            state: self.state,
            total_item_count: self.total_item_count,
            total_zip_bytes: self.total_zip_bytes,
            total_bytes: self.total_bytes,
            success_count: self.success_count,
            transient_failures: self.transient_failures,
            failed_resources: self.failed_resources.clone(),
            all_complete: self.all_complete,
            transferred_bytes,
            progress,
            entries: self.tracker.iter().cloned().collect(),
        }
    }

    /// Summary handed to the host when advancing to `next_stage`.
    pub fn completion_report(&self, next_stage: &str) -> CompletionReport {
        CompletionReport {
            session_id: self.session_id,
            next_stage: next_stage.to_string(),
            total_item_count: self.total_item_count,
            success_count: self.success_count,
            failed_resources: self.failed_resources.clone(),
        }
    }

    fn mark_all_complete(&mut self) {
        self.all_complete = true;
        self.state = SessionState::Complete;
    }

    fn accepts_item_event(&self, event: &str, name: &str) -> bool {
        match self.state {
            SessionState::Downloading => true,
            SessionState::Cancelled => {
                debug!("Ignoring {} for '{}' after cancellation", event, name);
                false
            }
            _ => {
                self.anomaly("unexpected_event", event, Some(name));
                false
            }
        }
    }

    fn anomaly(&self, kind: &str, event: &str, name: Option<&str>) {
        metrics::PROTOCOL_ANOMALIES.with_label_values(&[kind]).inc();
        match name {
            Some(name) => warn!(
                "Update resource '{}' is invalid: {} ({}) in state '{}'",
                name,
                event,
                kind,
                self.state.as_str()
            ),
            None => warn!(
                "Unexpected {} in state '{}' ({})",
                event,
                self.state.as_str(),
                kind
            ),
        }
    }
}
