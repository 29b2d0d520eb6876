//! Prometheus metrics for the update orchestrator.
//!
//! This module provides metrics for:
//! - Session outcomes (complete, cancelled, aborted)
//! - Per-resource results (success, retry, exhausted)
//! - Protocol anomalies reported by the transport
//! - Metered-network consent prompts

use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts};

// =============================================================================
// Sessions
// =============================================================================

/// Update sessions by outcome.
pub static UPDATE_SESSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("updraft_update_sessions_total", "Total update sessions by outcome"),
        &["outcome"], // "complete", "cancelled", "aborted"
    )
    .unwrap()
});

// =============================================================================
// Resources
// =============================================================================

/// Per-resource results reported by the transport.
pub static RESOURCE_UPDATES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "updraft_resource_updates_total",
            "Total resource update results",
        ),
        &["result"], // "success", "retry", "exhausted"
    )
    .unwrap()
});

/// Notifications that broke the transport's ordering contract.
pub static PROTOCOL_ANOMALIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "updraft_protocol_anomalies_total",
            "Total out-of-contract notifications from the transport",
        ),
        &["kind"], // "duplicate_start", "unknown_resource", "unexpected_event"
    )
    .unwrap()
});

// =============================================================================
// Consent
// =============================================================================

/// Consent dialog activity.
pub static CONSENT_PROMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "updraft_consent_prompts_total",
            "Metered-network consent prompts by event",
        ),
        &["event"], // "requested", "confirmed", "declined"
    )
    .unwrap()
});

/// All core metrics for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(UPDATE_SESSIONS.clone()),
        Box::new(RESOURCE_UPDATES.clone()),
        Box::new(PROTOCOL_ANOMALIES.clone()),
        Box::new(CONSENT_PROMPTS.clone()),
    ]
}
