use axum::routing::patch;
use axum::Router;

use crate::handlers::requests;
use crate::state::AppState;

/// Routes mounted at `/requests`.
///
/// ```text
/// PATCH /{id}/status    -> update_status
/// PATCH /{id}/position  -> update_position
/// PATCH /{id}/votes     -> cast_vote
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/status", patch(requests::update_status))
        .route("/{id}/position", patch(requests::update_position))
        .route("/{id}/votes", patch(requests::cast_vote))
}
