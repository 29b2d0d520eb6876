//! HTTP-facing implementations of the orchestrator's collaborators.
//!
//! The server does not download anything itself. An external agent polls
//! for transport commands, performs them, and posts the resulting
//! notifications back. Consent dialogs are parked until a client answers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use updraft_core::{
    CompletionReport, ConsentPrompt, ConsentRequest, EventBus, ProcedureHost, ResourceTransport,
    Subscription, UpdateEvent, UpdateEventHandler,
};

/// Work requested from the external download agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportCommand {
    CheckResources,
    UpdateResources,
}

/// Transport backed by an outbound command queue and inbound HTTP events.
#[derive(Debug, Default)]
pub struct HttpTransport {
    bus: EventBus,
    commands: Mutex<VecDeque<TransportCommand>>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand a notification received over HTTP to the subscribed session.
    pub fn deliver(&self, event: &UpdateEvent) {
        self.bus.publish(event);
    }

    /// Remove and return every queued command, oldest first.
    pub fn drain_commands(&self) -> Vec<TransportCommand> {
        self.lock_commands().drain(..).collect()
    }

    pub fn clear_commands(&self) {
        self.lock_commands().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    fn push(&self, command: TransportCommand) {
        info!("Queued transport command {:?}", command);
        self.lock_commands().push_back(command);
    }

    fn lock_commands(&self) -> std::sync::MutexGuard<'_, VecDeque<TransportCommand>> {
        self.commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResourceTransport for HttpTransport {
    fn subscribe(&self, handler: Arc<dyn UpdateEventHandler>) -> Subscription {
        self.bus.subscribe(handler)
    }

    fn check_resources(&self) {
        self.push(TransportCommand::CheckResources);
    }

    fn update_resources(&self) {
        self.push(TransportCommand::UpdateResources);
    }
}

/// Consent dialog as shown to HTTP clients.
#[derive(Debug, Clone, Serialize)]
pub struct ConsentDialog {
    pub session_id: Uuid,
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

/// Holds at most one unanswered consent request.
#[derive(Debug, Default)]
pub struct ConsentSlot {
    pending: Mutex<Option<ConsentRequest>>,
}

impl ConsentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialog(&self) -> Option<ConsentDialog> {
        self.lock().as_ref().map(|request| ConsentDialog {
            session_id: request.reply.session_id(),
            title: request.title.clone(),
            message: request.message.clone(),
            confirm_label: request.confirm_label.clone(),
            cancel_label: request.cancel_label.clone(),
        })
    }

    /// Take the pending request so it can be answered.
    pub fn take(&self) -> Option<ConsentRequest> {
        self.lock().take()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ConsentRequest>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConsentPrompt for ConsentSlot {
    fn request_consent(&self, request: ConsentRequest) {
        let previous = self.lock().replace(request);
        if let Some(previous) = previous {
            warn!(
                "Replacing unanswered consent request from session {}",
                previous.reply.session_id()
            );
        }
    }
}

/// Process-level host: remembers completion and signals shutdown.
#[derive(Debug)]
pub struct ServerHost {
    last_report: Mutex<Option<CompletionReport>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Default for ServerHost {
    fn default() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            last_report: Mutex::new(None),
            shutdown_tx,
        }
    }
}

impl ServerHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_report(&self) -> Option<CompletionReport> {
        self.last_report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn shutdown_requested(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Resolves once shutdown has been requested.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown_tx.subscribe();
        let _ = rx.wait_for(|requested| *requested).await;
    }
}

impl ProcedureHost for ServerHost {
    fn advance(&self, report: &CompletionReport) {
        if report.is_degraded() {
            warn!(
                "Advancing to '{}' with {} failed resources",
                report.next_stage,
                report.failed_resources.len()
            );
        } else {
            info!("Advancing to '{}'", report.next_stage);
        }
        *self
            .last_report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(report.clone());
    }

    fn request_shutdown(&self) {
        info!("Shutdown requested by update procedure");
        self.shutdown_tx.send_replace(true);
    }
}
