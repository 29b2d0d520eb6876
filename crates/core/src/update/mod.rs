//! Resource update orchestration.
//!
//! Drives one update run from version check to "all resources up to date":
//! - **Tracker**: per-resource transfer bookkeeping keyed by name
//! - **Session**: totals, counters and the state machine fed by transport events
//! - **Gate**: metered-network policy evaluated once after the check
//! - **Orchestrator**: enter/tick/leave lifecycle for the hosting procedure

mod bus;
pub(crate) mod config;
mod events;
mod gate;
mod orchestrator;
mod session;
mod tracker;
mod traits;
mod types;

pub use bus::{EventBus, Subscription};
pub use config::{ConsentDialogConfig, UpdateConfig};
pub use events::{
    CheckComplete, UpdateChanged, UpdateEvent, UpdateEventHandler, UpdateFailure, UpdateStart,
    UpdateSuccess,
};
pub use gate::{GateDecision, NetworkPolicyGate, SharedConnectivity};
pub use orchestrator::{Collaborators, UpdateOrchestrator};
pub use session::UpdateSession;
pub use tracker::{ResourceEntry, ResourceTracker, StartOutcome};
pub use traits::{
    ConnectivityProbe, ConsentPrompt, ConsentReply, ConsentRequest, ProcedureHost,
    ResourceTransport,
};
pub use types::{
    CompletionReport, ConsentAction, Connectivity, Directive, PendingConsent, SessionSnapshot,
    SessionState, UpdateError,
};
