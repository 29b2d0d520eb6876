//! Notifications emitted by the update transport.

use serde::{Deserialize, Serialize};

/// The version check finished; tells how much has to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckComplete {
    /// Number of resources that need to be updated.
    pub update_count: u32,
    /// Sum of the compressed sizes of those resources, in bytes.
    pub update_total_zip_length: u64,
    /// Sum of the uncompressed sizes of those resources, in bytes.
    pub update_total_length: u64,
}

/// The transport started downloading a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStart {
    pub name: String,
}

/// Download progress for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateChanged {
    pub name: String,
    /// Bytes transferred so far.
    pub current_length: u64,
}

/// A resource was downloaded and verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSuccess {
    pub name: String,
    /// Final compressed length of the resource.
    pub zip_length: u64,
}

/// A download attempt for a resource failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFailure {
    pub name: String,
    pub download_uri: String,
    pub error_message: String,
    /// Attempts made so far.
    pub retry_count: u32,
    /// Attempts the transport is willing to make in total.
    pub total_retry_count: u32,
}

impl UpdateFailure {
    /// True once the transport has given up on this resource.
    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= self.total_retry_count
    }
}

/// Any notification the transport can deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateEvent {
    CheckComplete(CheckComplete),
    UpdateStart(UpdateStart),
    UpdateChanged(UpdateChanged),
    UpdateSuccess(UpdateSuccess),
    UpdateFailure(UpdateFailure),
    UpdateAllComplete,
}

impl UpdateEvent {
    /// Returns the event name used in logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateEvent::CheckComplete(_) => "check_complete",
            UpdateEvent::UpdateStart(_) => "update_start",
            UpdateEvent::UpdateChanged(_) => "update_changed",
            UpdateEvent::UpdateSuccess(_) => "update_success",
            UpdateEvent::UpdateFailure(_) => "update_failure",
            UpdateEvent::UpdateAllComplete => "update_all_complete",
        }
    }

    /// Name of the resource a per-item event refers to.
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            UpdateEvent::UpdateStart(e) => Some(&e.name),
            UpdateEvent::UpdateChanged(e) => Some(&e.name),
            UpdateEvent::UpdateSuccess(e) => Some(&e.name),
            UpdateEvent::UpdateFailure(e) => Some(&e.name),
            UpdateEvent::CheckComplete(_) | UpdateEvent::UpdateAllComplete => None,
        }
    }
}

/// Receiver of transport notifications, one method per event kind.
///
/// Implementations must be cheap and non-blocking: the transport calls them
/// on whatever thread produced the notification.
pub trait UpdateEventHandler: Send + Sync {
    fn on_check_complete(&self, event: &CheckComplete);
    fn on_update_start(&self, event: &UpdateStart);
    fn on_update_changed(&self, event: &UpdateChanged);
    fn on_update_success(&self, event: &UpdateSuccess);
    fn on_update_failure(&self, event: &UpdateFailure);
    fn on_update_all_complete(&self);

    /// Route a tagged event to the matching method.
    fn dispatch(&self, event: &UpdateEvent) {
        match event {
            UpdateEvent::CheckComplete(e) => self.on_check_complete(e),
            UpdateEvent::UpdateStart(e) => self.on_update_start(e),
            UpdateEvent::UpdateChanged(e) => self.on_update_changed(e),
            UpdateEvent::UpdateSuccess(e) => self.on_update_success(e),
            UpdateEvent::UpdateFailure(e) => self.on_update_failure(e),
            UpdateEvent::UpdateAllComplete => self.on_update_all_complete(),
        }
    }
}
