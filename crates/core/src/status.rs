//! Request status values and the legal transition graph.
//!
//! `pending` is the only initial state; `done` and `rejected` are terminal.
//! The side effects of a transition (playing demotion, leaving the dense
//! position sequence) are applied by the engine, which consults
//! [`validate_transition`] first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Playing,
    Done,
    Rejected,
}

/// All statuses, in lifecycle order.
pub const ALL_STATUSES: [RequestStatus; 5] = [
    RequestStatus::Pending,
    RequestStatus::Accepted,
    RequestStatus::Playing,
    RequestStatus::Done,
    RequestStatus::Rejected,
];

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Playing => "playing",
            RequestStatus::Done => "done",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Orderable requests take part in the dense position sequence.
    pub fn is_orderable(self) -> bool {
        matches!(
            self,
            RequestStatus::Pending | RequestStatus::Accepted | RequestStatus::Playing
        )
    }

    pub fn is_terminal(self) -> bool {
        !self.is_orderable()
    }

    /// Statuses reachable from `self` in a single step.
    pub fn valid_transitions(self) -> &'static [RequestStatus] {
        use RequestStatus::*;
        match self {
            Pending => &[Accepted, Rejected],
            Accepted => &[Playing, Rejected, Pending],
            Playing => &[Done, Rejected],
            Done | Rejected => &[],
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STATUSES
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown status '{s}'. Must be one of: pending, accepted, playing, done, rejected"
                ))
            })
    }
}

/// Check whether `from -> to` is an edge of the transition graph.
///
/// Self-transitions are not edges; callers treat them as no-ops.
pub fn can_transition(from: RequestStatus, to: RequestStatus) -> bool {
    from.valid_transitions().contains(&to)
}

/// Outcome of validating a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The request already has the requested status.
    Unchanged,
    /// A legal edge that must be applied.
    Apply {
        from: RequestStatus,
        to: RequestStatus,
    },
}

/// Validate a requested status change.
pub fn validate_transition(
    from: RequestStatus,
    to: RequestStatus,
) -> Result<Transition, CoreError> {
    if from == to {
        return Ok(Transition::Unchanged);
    }
    if can_transition(from, to) {
        Ok(Transition::Apply { from, to })
    } else {
        Err(CoreError::InvalidTransition { from, to })
    }
}
