//! Admin routes. Handlers enforce the bearer token via `RequireAdmin`.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /sessions        -> list_sessions
/// DELETE /sessions/{id}   -> end_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(admin::list_sessions))
        .route("/sessions/{id}", delete(admin::end_session))
}
