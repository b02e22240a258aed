//! Handlers for starting sessions and resolving audience links.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use encore_core::models::session::CreateSession;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::state::AppState;

/// POST /sessions
///
/// Start a new session. Returns 201 with the session and its audience slug.
pub async fn create_session(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateSession>,
) -> AppResult<impl IntoResponse> {
    let session = state
        .engine
        .create_session_with_dj(&input.name, input.dj_name.as_deref())?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /sessions/{slug}
///
/// Resolve an audience link. Ended sessions still resolve, with
/// `is_active: false`.
pub async fn get_session_by_slug(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let session = state.engine.resolve_session(&slug)?;
    Ok(Json(session))
}
