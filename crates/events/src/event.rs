//! Queue change notifications.
//!
//! Events are invalidation cues, not state: they name what kind of change
//! happened so clients know to refetch the request list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use encore_core::types::DbId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueEventKind {
    /// A request was submitted.
    #[serde(rename = "request:new")]
    RequestNew,
    /// A request changed status, position, or votes.
    #[serde(rename = "request:update")]
    RequestUpdate,
}

impl QueueEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueueEventKind::RequestNew => "request:new",
            QueueEventKind::RequestUpdate => "request:update",
        }
    }
}

/// A change notification scoped to one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "type")]
    pub kind: QueueEventKind,
    pub session_id: DbId,
    /// The request that changed, when there is a single one.
    pub request_id: Option<DbId>,
    pub timestamp: DateTime<Utc>,
}

impl QueueEvent {
    pub fn new(kind: QueueEventKind, session_id: DbId) -> Self {
        Self {
            kind,
            session_id,
            request_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn request_new(session_id: DbId, request_id: DbId) -> Self {
        Self::new(QueueEventKind::RequestNew, session_id).with_request(request_id)
    }

    pub fn request_update(session_id: DbId, request_id: DbId) -> Self {
        Self::new(QueueEventKind::RequestUpdate, session_id).with_request(request_id)
    }

    pub fn with_request(mut self, request_id: DbId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// JSON text frame sent to WebSocket clients: `{"type": ..., "request_id": ...}`.
    pub fn to_wire(&self) -> String {
        let mut frame = serde_json::json!({ "type": self.kind.as_str() });
        if let Some(id) = self.request_id {
            frame["request_id"] = id.into();
        }
        frame.to_string()
    }
}
