//! Collaborators the orchestrator talks to.

use std::fmt;
use std::sync::{Arc, Weak};

use uuid::Uuid;

use super::bus::Subscription;
use super::events::UpdateEventHandler;
use super::types::{CompletionReport, Connectivity, UpdateError};

/// Source of update notifications and sink of check/download requests.
pub trait ResourceTransport: Send + Sync {
    /// Register a handler for every notification kind.
    ///
    /// Dropping the returned subscription unregisters the handler.
    fn subscribe(&self, handler: Arc<dyn UpdateEventHandler>) -> Subscription;

    /// Compare local resources with the remote version list.
    fn check_resources(&self);

    /// Download everything the last check reported as outdated.
    fn update_resources(&self);
}

/// Synchronous query for the current connection class.
pub trait ConnectivityProbe: Send + Sync {
    fn connectivity(&self) -> Connectivity;
}

/// Presents the metered-network confirmation dialog.
pub trait ConsentPrompt: Send + Sync {
    /// Show the dialog. The answer comes back later through `request.reply`.
    fn request_consent(&self, request: ConsentRequest);
}

/// The stage machine hosting the orchestrator.
pub trait ProcedureHost: Send + Sync {
    /// Switch to the next stage. Called at most once per session.
    fn advance(&self, report: &CompletionReport);

    /// Terminate the whole process.
    fn request_shutdown(&self);
}

pub(crate) trait ConsentSink: Send + Sync {
    fn resolve(&self, session_id: Uuid, confirmed: bool) -> Result<(), UpdateError>;
}

/// Dialog content plus the handle used to answer it.
#[derive(Debug)]
pub struct ConsentRequest {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub reply: ConsentReply,
}

/// One-shot answer handle for a consent request.
pub struct ConsentReply {
    session_id: Uuid,
    sink: Weak<dyn ConsentSink>,
}

impl ConsentReply {
    pub(crate) fn new(session_id: Uuid, sink: Weak<dyn ConsentSink>) -> Self {
        Self { session_id, sink }
    }

    /// Session the request was issued for.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The user agreed to download over the metered link.
    pub fn confirm(self) -> Result<(), UpdateError> {
        self.resolve(true)
    }

    /// The user refused; the process will be shut down.
    pub fn cancel(self) -> Result<(), UpdateError> {
        self.resolve(false)
    }

    fn resolve(self, confirmed: bool) -> Result<(), UpdateError> {
        match self.sink.upgrade() {
            Some(sink) => sink.resolve(self.session_id, confirmed),
            None => Err(UpdateError::NotEntered),
        }
    }
}

impl fmt::Debug for ConsentReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentReply")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}
