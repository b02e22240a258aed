//! Song request models and DTOs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::RequestStatus;
use crate::types::{DbId, Timestamp};

/// Maximum accepted length of any free-text request field, in characters.
pub const MAX_FIELD_LEN: usize = 500;

/// One audience-submitted song entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: DbId,
    pub session_id: DbId,
    pub guest_name: Option<String>,
    pub song_title: String,
    pub artist: Option<String>,
    pub note: Option<String>,
    pub status: RequestStatus,
    pub position: i32,
    pub tip_amount: Option<f64>,
    pub votes: i64,
    pub created_at: Timestamp,
}

/// DTO for `POST /sessions/{session_id}/requests`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    pub song_title: String,
    pub artist: Option<String>,
    pub guest_name: Option<String>,
    pub note: Option<String>,
    pub tip_amount: Option<f64>,
}

/// A validated submission with blank optional fields collapsed to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub song_title: String,
    pub artist: Option<String>,
    pub guest_name: Option<String>,
    pub note: Option<String>,
    pub tip_amount: Option<f64>,
}

impl SubmitRequest {
    pub fn validate(self) -> Result<NewRequest, CoreError> {
        let song_title = self.song_title.trim().to_string();
        if song_title.is_empty() {
            return Err(CoreError::Validation("song_title must not be empty".into()));
        }
        check_length("song_title", &song_title)?;

        let artist = optional_text("artist", self.artist)?;
        let guest_name = optional_text("guest_name", self.guest_name)?;
        let note = optional_text("note", self.note)?;

        if let Some(tip) = self.tip_amount {
            if !tip.is_finite() || tip < 0.0 {
                return Err(CoreError::Validation(
                    "tip_amount must be a non-negative number".into(),
                ));
            }
        }

        Ok(NewRequest {
            song_title,
            artist,
            guest_name,
            note,
            tip_amount: self.tip_amount,
        })
    }
}

fn optional_text(field: &str, value: Option<String>) -> Result<Option<String>, CoreError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => {
            check_length(field, &v)?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

fn check_length(field: &str, value: &str) -> Result<(), CoreError> {
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(())
}

/// DTO for `PATCH /requests/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatus {
    pub status: RequestStatus,
}

/// DTO for `PATCH /requests/{id}/position`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePosition {
    pub position: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// DTO for `PATCH /requests/{id}/votes`.
#[derive(Debug, Clone, Deserialize)]
pub struct CastVote {
    pub direction: VoteDirection,
}

/// Query parameters for `GET /sessions/{session_id}/requests`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<String>,
}

impl RequestListQuery {
    /// Parsed `status` filter; an empty value means no filter.
    pub fn status_filter(&self) -> Result<Option<RequestStatus>, CoreError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}
