//! Types for the update orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::tracker::ResourceEntry;

/// Errors returned by orchestrator entry points that can be misused.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The orchestrator has not been entered, or has been left.
    #[error("update orchestrator is not entered")]
    NotEntered,

    /// A consent reply arrived while nothing was pending.
    #[error("no consent request is pending")]
    NoPendingConsent,

    /// A consent reply belongs to a previous session.
    #[error("consent reply for stale session {0}")]
    StaleConsent(Uuid),
}

/// Connection class reported by the connectivity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Wi-Fi, ethernet, anything without a data cap.
    Unrestricted,
    /// Carrier data or another capped link.
    Metered,
    Offline,
}

impl Connectivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Unrestricted => "unrestricted",
            Connectivity::Metered => "metered",
            Connectivity::Offline => "offline",
        }
    }
}

/// What a consent answer leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentAction {
    /// Ask the transport to start downloading.
    BeginDownload,
    /// Stop the whole host process.
    Shutdown,
}

/// Decision waiting on the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConsent {
    pub on_confirm: ConsentAction,
    pub on_cancel: ConsentAction,
}

impl Default for PendingConsent {
    fn default() -> Self {
        Self {
            on_confirm: ConsentAction::BeginDownload,
            on_cancel: ConsentAction::Shutdown,
        }
    }
}

/// State of an update session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    /// Waiting for the transport to report what needs updating.
    Checking,
    /// Metered network; waiting for the user to confirm the download.
    AwaitingConsent(PendingConsent),
    Downloading,
    /// Every resource is up to date.
    Complete,
    /// The user declined the download.
    Cancelled,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Checking => "checking",
            SessionState::AwaitingConsent(_) => "awaiting_consent",
            SessionState::Downloading => "downloading",
            SessionState::Complete => "complete",
            SessionState::Cancelled => "cancelled",
        }
    }
}

/// Side effect a session asks its owner to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Ask the transport to compare local and remote resources.
    BeginCheck,
    /// Ask the transport to download the outdated resources.
    BeginDownload,
    /// Show the metered-network dialog.
    RequestConsent,
    /// Terminate the host process.
    Shutdown,
}

impl From<ConsentAction> for Directive {
    fn from(action: ConsentAction) -> Self {
        match action {
            ConsentAction::BeginDownload => Directive::BeginDownload,
            ConsentAction::Shutdown => Directive::Shutdown,
        }
    }
}

/// Read-only view of a session for UI and telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub state: SessionState,
    pub total_item_count: u32,
    pub total_zip_bytes: u64,
    pub total_bytes: u64,
    pub success_count: u32,
    pub transient_failures: u32,
    pub failed_resources: Vec<String>,
    pub all_complete: bool,
    pub transferred_bytes: u64,
    /// Transferred over total compressed bytes, 0.0 to 1.0.
    pub progress: f64,
    pub entries: Vec<ResourceEntry>,
}

/// Handed to the host when the update stage finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub session_id: Uuid,
    /// Stage the host should switch to.
    pub next_stage: String,
    pub total_item_count: u32,
    pub success_count: u32,
    /// Resources the transport gave up on.
    pub failed_resources: Vec<String>,
}

impl CompletionReport {
    /// True when some resources never made it.
    pub fn is_degraded(&self) -> bool {
        !self.failed_resources.is_empty()
    }
}
