//! Route definitions for sessions and their request queues.
//!
//! The second path segment is a slug on `GET /{session}` and a numeric
//! session id under `/{session}/requests`; both share one parameter name.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{requests, sessions};
use crate::state::AppState;

/// Routes mounted at `/sessions`.
///
/// ```text
/// POST /                     -> create_session
/// GET  /{session}            -> get_session_by_slug
/// GET  /{session}/requests   -> list_requests
/// POST /{session}/requests   -> submit_request
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(sessions::create_session))
        .route("/{session}", get(sessions::get_session_by_slug))
        .route(
            "/{session}/requests",
            get(requests::list_requests).post(requests::submit_request),
        )
}
