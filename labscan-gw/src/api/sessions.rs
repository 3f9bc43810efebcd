//! Scan session endpoints
//!
//! One session per bound input. Clients push edits to `/input` as the
//! operator types, submit the final text to `/scan`, and watch outcomes on
//! the event stream.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::{ScanSession, SessionSnapshot, SubmitOutcome};
use crate::AppState;

/// Body for input edits and scan submissions
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

async fn require_session(state: &AppState, id: Uuid) -> ApiResult<ScanSession> {
    state
        .session(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No session {}", id)))
}

/// POST /api/sessions
///
/// Open a new scan session and return its initial snapshot.
pub async fn create_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let session = state.create_session().await;
    Json(session.snapshot().await)
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session = require_session(&state, id).await?;
    Ok(Json(session.snapshot().await))
}

/// POST /api/sessions/:id/input
///
/// Record an input edit without submitting it. Edits feed the scan-origin
/// classifier and dismiss lingering feedback.
pub async fn session_input(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TextRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session = require_session(&state, id).await?;
    session.input(&request.text).await;
    Ok(Json(session.snapshot().await))
}

/// POST /api/sessions/:id/scan
///
/// Submit the input as a scan attempt. Returns the debounce decision
/// immediately; validation outcomes arrive on the event stream.
pub async fn session_scan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TextRequest>,
) -> ApiResult<Json<SubmitOutcome>> {
    let session = require_session(&state, id).await?;
    Ok(Json(session.submit(&request.text).await))
}

/// POST /api/sessions/:id/clear
///
/// Clear the bound input and all scan state.
pub async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session = require_session(&state, id).await?;
    session.clear().await;
    Ok(Json(session.snapshot().await))
}

/// DELETE /api/sessions/:id
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.close_session(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("No session {}", id)))
    }
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/:id",
            get(get_session).delete(close_session),
        )
        .route("/api/sessions/:id/input", post(session_input))
        .route("/api/sessions/:id/scan", post(session_scan))
        .route("/api/sessions/:id/clear", post(clear_session))
}
