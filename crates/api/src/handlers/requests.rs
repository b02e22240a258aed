//! Handlers for song requests: audience submission and votes, DJ moderation
//! and reordering.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use encore_core::models::request::{
    CastVote, RequestListQuery, SubmitRequest, UpdatePosition, UpdateStatus,
};
use encore_core::types::DbId;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

/// GET /sessions/{session_id}/requests?status=
///
/// Requests in queue order. Orderable requests come first by position,
/// finished ones after them.
pub async fn list_requests(
    State(state): State<AppState>,
    AppPath(session_id): AppPath<DbId>,
    AppQuery(query): AppQuery<RequestListQuery>,
) -> AppResult<impl IntoResponse> {
    let status = query.status_filter()?;
    let requests = state.engine.list_requests(session_id, status).await?;
    Ok(Json(requests))
}

/// POST /sessions/{session_id}/requests
pub async fn submit_request(
    State(state): State<AppState>,
    AppPath(session_id): AppPath<DbId>,
    AppJson(input): AppJson<SubmitRequest>,
) -> AppResult<impl IntoResponse> {
    let request = state.engine.submit_request(session_id, input).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// PATCH /requests/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<UpdateStatus>,
) -> AppResult<impl IntoResponse> {
    let request = state.engine.set_status(id, input.status).await?;
    Ok(Json(request))
}

/// PATCH /requests/{id}/position
///
/// Positions outside `[1, N]` are clamped.
pub async fn update_position(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<UpdatePosition>,
) -> AppResult<impl IntoResponse> {
    let request = state.engine.reposition(id, input.position).await?;
    Ok(Json(request))
}

/// PATCH /requests/{id}/votes
pub async fn cast_vote(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<CastVote>,
) -> AppResult<impl IntoResponse> {
    let request = state.engine.vote(id, input.direction).await?;
    Ok(Json(request))
}
