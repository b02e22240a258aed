pub mod admin;
pub mod health;
pub mod requests;
pub mod sessions;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the route tree. Paths live at the root to match the browser client.
///
/// ```text
/// /sessions                                        start (POST)
/// /sessions/{session}                              resolve slug (GET)
/// /sessions/{session}/requests                     list, submit
///
/// /requests/{id}/status                            set status (PATCH)
/// /requests/{id}/position                          reposition (PATCH)
/// /requests/{id}/votes                             vote (PATCH)
///
/// /admin/sessions                                  list (bearer)
/// /admin/sessions/{id}                             end (DELETE, bearer)
///
/// /ws/sessions/{session_id}                        WebSocket
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws/sessions/{session_id}", get(ws::ws_handler))
        .nest("/sessions", sessions::router())
        .nest("/requests", requests::router())
        .nest("/admin", admin::router())
}
