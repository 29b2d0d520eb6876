//! Update orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the update orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// How often the host polls for completion (milliseconds).
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Ask before downloading over a metered connection.
    /// When disabled, metered connections are treated like unrestricted ones.
    #[serde(default = "default_consent_on_metered")]
    pub consent_on_metered: bool,

    /// Stage the host switches to once all resources are up to date.
    #[serde(default = "default_next_stage")]
    pub next_stage: String,

    /// Localization keys for the metered-network dialog.
    #[serde(default)]
    pub consent: ConsentDialogConfig,
}

/// Localization keys used to build the consent dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentDialogConfig {
    #[serde(default = "default_title_key")]
    pub title_key: String,
    #[serde(default = "default_message_key")]
    pub message_key: String,
    #[serde(default = "default_confirm_key")]
    pub confirm_key: String,
    #[serde(default = "default_cancel_key")]
    pub cancel_key: String,
}

fn default_tick_interval() -> u64 {
    100
}

fn default_consent_on_metered() -> bool {
    true
}

fn default_next_stage() -> String {
    "preload".to_string()
}

pub(crate) fn default_title_key() -> String {
    "UpdateResourceViaCarrierDataNetwork.Title".to_string()
}

pub(crate) fn default_message_key() -> String {
    "UpdateResourceViaCarrierDataNetwork.Message".to_string()
}

pub(crate) fn default_confirm_key() -> String {
    "UpdateResourceViaCarrierDataNetwork.UpdateButton".to_string()
}

pub(crate) fn default_cancel_key() -> String {
    "UpdateResourceViaCarrierDataNetwork.QuitButton".to_string()
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            consent_on_metered: default_consent_on_metered(),
            next_stage: default_next_stage(),
            consent: ConsentDialogConfig::default(),
        }
    }
}

impl Default for ConsentDialogConfig {
    fn default() -> Self {
        Self {
            title_key: default_title_key(),
            message_key: default_message_key(),
            confirm_key: default_confirm_key(),
            cancel_key: default_cancel_key(),
        }
    }
}
