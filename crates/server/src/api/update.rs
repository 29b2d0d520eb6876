//! Update procedure API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;
use updraft_core::{
    CompletionReport, Connectivity, ConnectivityProbe, SessionSnapshot, UpdateError, UpdateEvent,
};

use crate::bridge::{ConsentDialog, TransportCommand};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub session: SessionSnapshot,
    pub entered: bool,
    pub advanced: bool,
    pub shutdown_requested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionReport>,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct CommandsResponse {
    pub commands: Vec<TransportCommand>,
}

#[derive(Debug, Deserialize)]
pub struct ConsentAnswer {
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct ConsentAnswered {
    pub confirmed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectivityBody {
    pub connectivity: Connectivity,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn map_update_error(err: UpdateError) -> ApiError {
    let status = match err {
        UpdateError::NoPendingConsent => StatusCode::NOT_FOUND,
        UpdateError::NotEntered | UpdateError::StaleConsent(_) => StatusCode::CONFLICT,
    };
    error(status, err.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/update/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let orchestrator = state.orchestrator();
    Json(StatusResponse {
        session: orchestrator.snapshot(),
        entered: orchestrator.is_entered(),
        advanced: orchestrator.has_advanced(),
        shutdown_requested: state.host().shutdown_requested(),
        completion: state.host().last_report(),
    })
}

/// POST /api/v1/update/events
///
/// Delivers one transport notification to the running session.
pub async fn post_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<UpdateEvent>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    if !state.orchestrator().is_entered() {
        return Err(map_update_error(UpdateError::NotEntered));
    }

    match event.resource_name() {
        Some(name) => debug!(
            "Received {} notification for '{}' over HTTP",
            event.kind(),
            name
        ),
        None => debug!("Received {} notification over HTTP", event.kind()),
    }
    state.transport().deliver(&event);
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { accepted: true })))
}

/// GET /api/v1/update/commands
pub async fn drain_commands(State(state): State<Arc<AppState>>) -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: state.transport().drain_commands(),
    })
}

/// GET /api/v1/update/consent
pub async fn get_consent(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConsentDialog>, ApiError> {
    state
        .consent()
        .dialog()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "No consent request pending"))
}

/// POST /api/v1/update/consent
pub async fn answer_consent(
    State(state): State<Arc<AppState>>,
    Json(answer): Json<ConsentAnswer>,
) -> Result<Json<ConsentAnswered>, ApiError> {
    let request = state
        .consent()
        .take()
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "No consent request pending"))?;

    let result = if answer.confirm {
        request.reply.confirm()
    } else {
        request.reply.cancel()
    };
    result.map_err(map_update_error)?;

    Ok(Json(ConsentAnswered {
        confirmed: answer.confirm,
    }))
}

/// GET /api/v1/update/connectivity
pub async fn get_connectivity(State(state): State<Arc<AppState>>) -> Json<ConnectivityBody> {
    Json(ConnectivityBody {
        connectivity: state.connectivity().connectivity(),
    })
}

/// PUT /api/v1/update/connectivity
pub async fn set_connectivity(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConnectivityBody>,
) -> Json<ConnectivityBody> {
    state.connectivity().set(body.connectivity);
    Json(body)
}

/// POST /api/v1/update/restart
pub async fn restart(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    state.restart();
    get_status(State(state)).await
}
