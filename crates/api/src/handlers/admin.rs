//! Admin handlers. Every endpoint requires [`RequireAdmin`].

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use encore_core::models::session::SessionSummary;
use encore_core::types::DbId;
use serde::Serialize;

use crate::error::AppResult;
use crate::extract::AppPath;
use crate::middleware::auth::RequireAdmin;
use crate::state::AppState;

/// Response for GET /admin/sessions.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

/// GET /admin/sessions
///
/// Every session, newest first, with its request count.
pub async fn list_sessions(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let sessions = state.engine.list_sessions();
    Ok(Json(SessionListResponse { sessions }))
}

/// DELETE /admin/sessions/{id}
///
/// End a session. Idempotent; the session and its requests are retained.
pub async fn end_session(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    state.engine.end_session(id).await?;
    tracing::info!(session_id = id, "Session ended by admin");
    Ok(StatusCode::NO_CONTENT)
}
