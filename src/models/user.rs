use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Current version of the serialized session payload.
///
/// Bump this when the shape of `SessionUser` changes; older payloads are then
/// rejected on read and the session treated as absent.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// The authenticated identity stored inside a session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Payload schema version; must equal `SESSION_SCHEMA_VERSION`.
    pub schema_version: u32,
    /// The account name of the authenticated user.
    pub username: String,
    /// The role granted to the session.
    pub role: String,
    /// When the session was established.
    pub logged_in_at: DateTime<Utc>,
}

impl SessionUser {
    pub fn new(username: &str, role: &str) -> Self {
        Self {
            schema_version: SESSION_SCHEMA_VERSION,
            username: username.to_string(),
            role: role.to_string(),
            logged_in_at: Utc::now(),
        }
    }

    /// Serializes the payload for storage.
    pub fn to_json(&self) -> Result<String> {
        sonic_rs::to_string(self)
            .map_err(|e| AppError::Serialization(format!("Session payload encode failed: {e}")))
    }

    /// Deserializes a stored payload, rejecting unknown schema versions.
    pub fn from_json(raw: &str) -> Result<Self> {
        let user: SessionUser = sonic_rs::from_str(raw)
            .map_err(|e| AppError::Serialization(format!("Session payload decode failed: {e}")))?;

        if user.schema_version != SESSION_SCHEMA_VERSION {
            return Err(AppError::Serialization(format!(
                "Unsupported session payload version: {}",
                user.schema_version
            )));
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips() {
        let user = SessionUser::new("admin", "admin");
        let json = user.to_json().unwrap();
        let decoded = SessionUser::from_json(&json).unwrap();
        assert_eq!(decoded, user);
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let mut user = SessionUser::new("admin", "admin");
        user.schema_version = 99;
        let json = user.to_json().unwrap();
        assert!(SessionUser::from_json(&json).is_err());
    }

    #[test]
    fn malformed_payload_is_rejected() {
        assert!(SessionUser::from_json("not json").is_err());
        assert!(SessionUser::from_json(r#"{"username":"admin"}"#).is_err());
        assert!(SessionUser::from_json("").is_err());
    }
}
