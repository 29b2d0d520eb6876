//! Prometheus metrics for observability.
//!
//! Combines the update counters recorded by the core crate with gauges
//! describing the current session, refreshed on every scrape.

use once_cell::sync::Lazy;
use prometheus::{self, Encoder, Gauge, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use tracing::error;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// Session Metrics (collected dynamically)
// =============================================================================

/// Current session state (1 for the active state, 0 otherwise).
pub static SESSION_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("updraft_session_state", "Current update session state"),
        &["state"],
    )
    .unwrap()
});

/// Resources announced by the version check.
pub static SESSION_TOTAL_ITEMS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "updraft_session_total_items",
        "Resources that need updating in the current session",
    )
    .unwrap()
});

/// Resources updated so far.
pub static SESSION_SUCCESS_COUNT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "updraft_session_success_count",
        "Resources successfully updated in the current session",
    )
    .unwrap()
});

/// Transferred over total compressed bytes.
pub static SESSION_PROGRESS: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "updraft_session_progress_ratio",
        "Download progress of the current session (0.0 - 1.0)",
    )
    .unwrap()
});

const STATES: [&str; 6] = [
    "idle",
    "checking",
    "awaiting_consent",
    "downloading",
    "complete",
    "cancelled",
];

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(SESSION_STATE.clone())).unwrap();
    registry
        .register(Box::new(SESSION_TOTAL_ITEMS.clone()))
        .unwrap();
    registry
        .register(Box::new(SESSION_SUCCESS_COUNT.clone()))
        .unwrap();
    registry
        .register(Box::new(SESSION_PROGRESS.clone()))
        .unwrap();

    // Core update counters
    for metric in updraft_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Refresh session gauges from the orchestrator before encoding.
pub fn collect_dynamic_metrics(state: &AppState) {
    let snapshot = state.orchestrator().snapshot();
    let current = snapshot.state.as_str();

    for name in STATES {
        SESSION_STATE
            .with_label_values(&[name])
            .set(if name == current { 1 } else { 0 });
    }
    SESSION_TOTAL_ITEMS.set(snapshot.total_item_count as i64);
    SESSION_SUCCESS_COUNT.set(snapshot.success_count as i64);
    SESSION_PROGRESS.set(snapshot.progress);
}

#[cfg(test)]
mod tests {
    use super::*;
    use updraft_core::Config;

    #[test]
    fn test_encode_includes_session_gauges() {
        let state = AppState::new(Config::default(), None);
        collect_dynamic_metrics(&state);

        let text = encode_metrics();
        assert!(text.contains("updraft_session_state{state=\"idle\"} 1"));
        assert!(text.contains("updraft_session_total_items 0"));
    }
}
