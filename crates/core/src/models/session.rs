//! Session models and DTOs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Maximum accepted length of a session name, in characters.
pub const MAX_SESSION_NAME_LEN: usize = 120;

/// Maximum accepted length of a DJ display name, in characters.
pub const MAX_DJ_NAME_LEN: usize = 80;

/// A DJ session as returned by `POST /sessions` and `GET /sessions/{slug}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub dj_name: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub ends_at: Option<Timestamp>,
}

/// Row of the admin session listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    /// Serialized as `null` when the session was started without one.
    pub dj_name: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub ends_at: Option<Timestamp>,
    /// Live count of every request in the session, terminal ones included.
    pub request_count: usize,
}

/// DTO for `POST /sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSession {
    pub name: String,
    #[serde(default)]
    pub dj_name: Option<String>,
}

/// Trimmed session name, or a validation error when empty or too long.
pub fn validate_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("name must not be empty".into()));
    }
    if name.chars().count() > MAX_SESSION_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "name must be at most {MAX_SESSION_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Trimmed DJ name. Blank or absent names become `None`.
pub fn validate_dj_name(dj_name: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(dj_name) = dj_name.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if dj_name.chars().count() > MAX_DJ_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "dj_name must be at most {MAX_DJ_NAME_LEN} characters"
        )));
    }
    Ok(Some(dj_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed() {
        assert_eq!(validate_name("  Friday Night ").unwrap(), "Friday Night");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(matches!(validate_name("   "), Err(CoreError::Validation(_))));
    }

    #[test]
    fn dj_name_is_optional_and_trimmed() {
        assert_eq!(validate_dj_name(None).unwrap(), None);
        assert_eq!(validate_dj_name(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_dj_name(Some(" DJ Nova ")).unwrap(),
            Some("DJ Nova".to_string())
        );
        let long = "x".repeat(MAX_DJ_NAME_LEN + 1);
        assert!(validate_dj_name(Some(&long)).is_err());
    }

    #[test]
    fn create_session_without_dj_name_parses() {
        let input: CreateSession = serde_json::from_str(r#"{"name":"Gig"}"#).unwrap();
        assert_eq!(input.dj_name, None);
    }

    #[test]
    fn overlong_name_is_rejected() {
        let name = "x".repeat(MAX_SESSION_NAME_LEN + 1);
        assert!(validate_name(&name).is_err());
    }
}
