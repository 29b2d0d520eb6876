//! Update orchestrator lifecycle.
//!
//! Wires an [`UpdateSession`] to the transport for the duration of one
//! procedure run:
//! - `enter`: reset the session, subscribe, ask the transport to check
//! - `tick`: poll completion, advance the host once
//! - `leave`: drop the subscription
//!
//! All session access goes through one mutex. Collaborators are only called
//! after that lock is released, so a transport may publish synchronously from
//! inside `check_resources` or `update_resources`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::localization::Localizer;
use crate::metrics;

use super::bus::Subscription;
use super::config::UpdateConfig;
use super::events::{
    CheckComplete, UpdateChanged, UpdateEventHandler, UpdateFailure, UpdateStart, UpdateSuccess,
};
use super::gate::NetworkPolicyGate;
use super::session::UpdateSession;
use super::traits::{
    ConnectivityProbe, ConsentPrompt, ConsentReply, ConsentRequest, ConsentSink, ProcedureHost,
    ResourceTransport,
};
use super::types::{Directive, SessionSnapshot, SessionState, UpdateError};

/// External parties the orchestrator works with.
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn ResourceTransport>,
    pub prompt: Arc<dyn ConsentPrompt>,
    pub host: Arc<dyn ProcedureHost>,
    pub connectivity: Arc<dyn ConnectivityProbe>,
    pub localizer: Arc<dyn Localizer>,
}

struct Inner {
    config: UpdateConfig,
    collaborators: Collaborators,
    session: Mutex<UpdateSession>,
    subscription: Mutex<Option<Subscription>>,
    entered: AtomicBool,
    advanced: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
    self_ref: Weak<Inner>,
}

/// Drives one resource update procedure.
#[derive(Clone)]
pub struct UpdateOrchestrator {
    inner: Arc<Inner>,
}

impl UpdateOrchestrator {
    /// Create an orchestrator. Nothing happens until [`enter`](Self::enter).
    pub fn new(config: UpdateConfig, collaborators: Collaborators) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let inner = Arc::new_cyclic(|self_ref| {
            let gate = Inner::build_gate(&config, &collaborators);
            Inner {
                config,
                collaborators,
                session: Mutex::new(UpdateSession::new(gate)),
                subscription: Mutex::new(None),
                entered: AtomicBool::new(false),
                advanced: AtomicBool::new(false),
                shutdown_tx,
                self_ref: self_ref.clone(),
            }
        });
        Self { inner }
    }

    pub fn config(&self) -> &UpdateConfig {
        &self.inner.config
    }

    /// Start a fresh session and ask the transport to check resources.
    ///
    /// Entering twice without leaving tears the previous registration down
    /// first.
    pub fn enter(&self) {
        if self.is_entered() {
            warn!("Update procedure entered while still active, tearing down previous session");
            self.leave(true);
        }

        let session_id = {
            let mut session = self.inner.lock_session();
            *session = UpdateSession::new(Inner::build_gate(
                &self.inner.config,
                &self.inner.collaborators,
            ));
            self.inner.advanced.store(false, Ordering::SeqCst);
            session.session_id()
        };

        let handler = Arc::new(SessionHandler {
            inner: Arc::downgrade(&self.inner),
            session_id,
        });
        let subscription = self.inner.collaborators.transport.subscribe(handler);
        *self.inner.lock_subscription() = Some(subscription);
        self.inner.entered.store(true, Ordering::SeqCst);

        info!("Entering update procedure, session {}", session_id);
        self.inner.apply(session_id, |session| session.begin());
    }

    /// Poll for completion. Advances the host at most once per session.
    ///
    /// Returns true on the tick that advanced.
    pub fn tick(&self) -> bool {
        if !self.is_entered() {
            return false;
        }

        let report = {
            let session = self.inner.lock_session();
            if !session.is_complete() {
                return false;
            }
            if self.inner.advanced.swap(true, Ordering::SeqCst) {
                return false;
            }
            session.completion_report(&self.inner.config.next_stage)
        };

        metrics::UPDATE_SESSIONS
            .with_label_values(&["complete"])
            .inc();
        info!(
            "Resources up to date ({}/{} updated), advancing to '{}'",
            report.success_count, report.total_item_count, report.next_stage
        );
        self.inner.collaborators.host.advance(&report);
        true
    }

    /// Unregister from the transport. Safe to call at any time, repeatedly.
    pub fn leave(&self, is_abort: bool) {
        let subscription = self.inner.lock_subscription().take();
        let was_entered = self.inner.entered.swap(false, Ordering::SeqCst);
        drop(subscription);

        if !was_entered {
            debug!("Leave called on inactive update procedure");
            return;
        }

        let session = self.inner.lock_session();
        if is_abort && !matches!(session.state(), SessionState::Complete | SessionState::Cancelled)
        {
            metrics::UPDATE_SESSIONS
                .with_label_values(&["aborted"])
                .inc();
        }
        info!(
            "Leaving update procedure, session {} in state '{}'{}",
            session.session_id(),
            session.state().as_str(),
            if is_abort { " (abort)" } else { "" }
        );
    }

    pub fn is_entered(&self) -> bool {
        self.inner.entered.load(Ordering::SeqCst)
    }

    /// True once the host has been told to advance in the current session.
    pub fn has_advanced(&self) -> bool {
        self.inner.advanced.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock_session().state()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock_session().snapshot()
    }

    /// Run [`tick`](Self::tick) on a timer until it advances or
    /// [`stop_tick_loop`](Self::stop_tick_loop) is called.
    pub fn spawn_tick_loop(&self) -> tokio::task::JoinHandle<()> {
        let orchestrator = self.clone();
        let interval = Duration::from_millis(self.inner.config.tick_interval_ms);
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Update tick loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Update tick loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if orchestrator.tick() {
                            break;
                        }
                    }
                }
            }
            info!("Update tick loop stopped");
        })
    }

    /// Signal every running tick loop to stop.
    pub fn stop_tick_loop(&self) {
        let _ = self.inner.shutdown_tx.send(());
    }
}

impl Inner {
    fn build_gate(config: &UpdateConfig, collaborators: &Collaborators) -> NetworkPolicyGate {
        NetworkPolicyGate::new(
            Arc::clone(&collaborators.connectivity),
            config.consent_on_metered,
        )
    }

    fn lock_session(&self) -> MutexGuard<'_, UpdateSession> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_subscription(&self) -> MutexGuard<'_, Option<Subscription>> {
        self.subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` against the session if it is still `session_id`, then carry
    /// out the resulting directive with the lock released.
    fn apply<F>(&self, session_id: Uuid, f: F)
    where
        F: FnOnce(&mut UpdateSession) -> Option<Directive>,
    {
        let directive = {
            let mut session = self.lock_session();
            if session.session_id() != session_id {
                debug!("Dropping notification for stale session {}", session_id);
                return;
            }
            f(&mut session)
        };

        if let Some(directive) = directive {
            self.execute(directive, session_id);
        }
    }

    fn execute(&self, directive: Directive, session_id: Uuid) {
        let collaborators = &self.collaborators;
        match directive {
            Directive::BeginCheck => collaborators.transport.check_resources(),
            Directive::BeginDownload => {
                info!("Start update resources...");
                collaborators.transport.update_resources();
            }
            Directive::RequestConsent => {
                let keys = &self.config.consent;
                let localizer = &collaborators.localizer;
                let sink: Weak<dyn ConsentSink> = self.self_ref.clone();
                let request = ConsentRequest {
                    title: localizer.get_string(&keys.title_key),
                    message: localizer.get_string(&keys.message_key),
                    confirm_label: localizer.get_string(&keys.confirm_key),
                    cancel_label: localizer.get_string(&keys.cancel_key),
                    reply: ConsentReply::new(session_id, sink),
                };
                metrics::CONSENT_PROMPTS
                    .with_label_values(&["requested"])
                    .inc();
                collaborators.prompt.request_consent(request);
            }
            Directive::Shutdown => {
                metrics::UPDATE_SESSIONS
                    .with_label_values(&["cancelled"])
                    .inc();
                warn!("Resource update declined on metered network, shutting down");
                collaborators.host.request_shutdown();
            }
        }
    }
}

impl ConsentSink for Inner {
    fn resolve(&self, session_id: Uuid, confirmed: bool) -> Result<(), UpdateError> {
        if !self.entered.load(Ordering::SeqCst) {
            return Err(UpdateError::NotEntered);
        }

        let directive = {
            let mut session = self.lock_session();
            if session.session_id() != session_id {
                return Err(UpdateError::StaleConsent(session_id));
            }
            session
                .resolve_consent(confirmed)
                .ok_or(UpdateError::NoPendingConsent)?
        };

        self.execute(directive, session_id);
        Ok(())
    }
}

/// Subscriber registered with the transport for one session.
struct SessionHandler {
    inner: Weak<Inner>,
    session_id: Uuid,
}

impl SessionHandler {
    fn with_session<F>(&self, f: F)
    where
        F: FnOnce(&mut UpdateSession) -> Option<Directive>,
    {
        if let Some(inner) = self.inner.upgrade() {
            inner.apply(self.session_id, f);
        }
    }
}

impl UpdateEventHandler for SessionHandler {
    fn on_check_complete(&self, event: &CheckComplete) {
        self.with_session(|s| s.on_check_complete(event));
    }

    fn on_update_start(&self, event: &UpdateStart) {
        self.with_session(|s| {
            s.on_update_start(event);
            None
        });
    }

    fn on_update_changed(&self, event: &UpdateChanged) {
        self.with_session(|s| {
            s.on_update_changed(event);
            None
        });
    }

    fn on_update_success(&self, event: &UpdateSuccess) {
        self.with_session(|s| {
            s.on_update_success(event);
            None
        });
    }

    fn on_update_failure(&self, event: &UpdateFailure) {
        self.with_session(|s| {
            s.on_update_failure(event);
            None
        });
    }

    fn on_update_all_complete(&self) {
        self.with_session(|s| {
            s.on_update_all_complete();
            None
        });
    }
}
