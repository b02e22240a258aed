//! Status transition authority.
//!
//! The single place that decides what a status change does to a session's
//! queue: legality (via [`encore_core::status`]), the one-playing-request
//! rule, and leaving the position sequence on terminal statuses. Runs inside
//! the session's critical section.

use encore_core::error::CoreError;
use encore_core::models::request::Request;
use encore_core::status::{validate_transition, RequestStatus, Transition};
use encore_core::types::DbId;

use crate::store::SessionQueue;

/// Status the previously playing request moves to when another one starts.
pub const DEMOTED_PLAYING_STATUS: RequestStatus = RequestStatus::Done;

/// Result of [`apply_status`].
#[derive(Debug, Clone)]
pub struct StatusChange {
    /// The request after the change.
    pub request: Request,
    pub from: RequestStatus,
    /// Request that was playing and got demoted to make room.
    pub demoted: Option<DbId>,
}

impl StatusChange {
    /// `false` when the request already had the requested status.
    pub fn changed(&self) -> bool {
        self.from != self.request.status
    }
}

/// Move `request_id` to status `to`, applying every side effect atomically.
pub fn apply_status(
    queue: &mut SessionQueue,
    request_id: DbId,
    to: RequestStatus,
) -> Result<StatusChange, CoreError> {
    let current = queue.require(request_id)?.status;

    let (from, to) = match validate_transition(current, to)? {
        Transition::Unchanged => {
            return Ok(StatusChange {
                request: queue.require(request_id)?.clone(),
                from: current,
                demoted: None,
            });
        }
        Transition::Apply { from, to } => (from, to),
    };

    let mut demoted = None;
    if to == RequestStatus::Playing {
        if let Some(previous) = queue.playing().filter(|&id| id != request_id) {
            queue.set_status(previous, DEMOTED_PLAYING_STATUS)?;
            demoted = Some(previous);
        }
    }

    queue.set_status(request_id, to)?;

    Ok(StatusChange {
        request: queue.require(request_id)?.clone(),
        from,
        demoted,
    })
}
