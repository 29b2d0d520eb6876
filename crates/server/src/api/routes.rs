use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, update};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and build metadata
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/build-info", get(handlers::get_build_info))
        .route("/metrics", get(handlers::metrics))
        // Update procedure
        .route("/update/status", get(update::get_status))
        .route("/update/events", post(update::post_event))
        .route("/update/commands", get(update::drain_commands))
        .route(
            "/update/consent",
            get(update::get_consent).post(update::answer_consent),
        )
        .route(
            "/update/connectivity",
            get(update::get_connectivity).put(update::set_connectivity),
        )
        .route("/update/restart", post(update::restart))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
}
