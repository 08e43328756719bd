use chrono::{DateTime, Duration, Utc};
use deadpool_postgres::Pool;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::Result;
use crate::models::session::SessionRecord;
use crate::models::user::SessionUser;

/// Raw entropy behind a session identifier (256 bits).
const SESSION_ID_BYTES: usize = 32;

/// Length of a hex-encoded session identifier.
pub const SESSION_ID_LEN: usize = SESSION_ID_BYTES * 2;

/// Generates a new cryptographically random session identifier.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Cheap attacker-input filter: a session id must be exactly 64 lowercase
/// hex characters. Anything else is rejected before touching storage.
pub fn is_valid_session_id(id: &str) -> bool {
    id.len() == SESSION_ID_LEN && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Creates a session for `user` expiring `ttl` from now; returns its id.
pub async fn create(pool: &Pool, user: &SessionUser, ttl: Duration) -> Result<String> {
    let id = generate_session_id();
    let data = user.to_json()?;
    let expires_at = Utc::now() + ttl;

    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO sessions (id, data, expires_at)
            VALUES ($1, $2, $3)
            "#,
            &[&id, &data, &expires_at],
        )
        .await?;

    tracing::debug!(session = &id[..8], "Session created");
    Ok(id)
}

/// Resolves a session id to its payload.
///
/// Returns `None` without any storage query for ids that fail the shape
/// check. Expired rows and rows with undecodable payloads are deleted on
/// read and reported absent.
pub async fn resolve(pool: &Pool, id: &str) -> Result<Option<SessionUser>> {
    if !is_valid_session_id(id) {
        return Ok(None);
    }

    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT data, expires_at
            FROM sessions
            WHERE id = $1
            "#,
            &[&id],
        )
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let record = SessionRecord {
        id: id.to_string(),
        data: row.try_get("data")?,
        expires_at: row.try_get::<_, DateTime<Utc>>("expires_at")?,
    };

    if record.is_expired() {
        tracing::info!(session = &record.id[..8], "Session expired, removing");
        client
            .execute("DELETE FROM sessions WHERE id = $1", &[&id])
            .await?;
        return Ok(None);
    }

    match SessionUser::from_json(&record.data) {
        Ok(user) => Ok(Some(user)),
        Err(e) => {
            tracing::warn!(session = &record.id[..8], error = %e, "Dropping session with undecodable payload");
            client
                .execute("DELETE FROM sessions WHERE id = $1", &[&id])
                .await?;
            Ok(None)
        }
    }
}

/// Idempotent delete; no error if the session is already gone.
pub async fn destroy(pool: &Pool, id: &str) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute("DELETE FROM sessions WHERE id = $1", &[&id])
        .await?;
    Ok(())
}

/// Deletes all expired sessions; returns the number removed.
///
/// Driven by the background cleanup task, independent of request traffic.
pub async fn sweep(pool: &Pool) -> Result<u64> {
    let client = pool.get().await?;
    let removed = client
        .execute("DELETE FROM sessions WHERE expires_at <= NOW()", &[])
        .await?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_have_the_expected_shape() {
        let id = generate_session_id();
        assert_eq!(id.len(), SESSION_ID_LEN);
        assert!(is_valid_session_id(&id));
        assert_ne!(id, generate_session_id());
    }

    #[test]
    fn shape_filter_rejects_non_hex_input() {
        assert!(is_valid_session_id(&"a".repeat(64)));
        assert!(is_valid_session_id(&"0123456789abcdef".repeat(4)));

        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("abc"));
        assert!(!is_valid_session_id(&"a".repeat(63)));
        assert!(!is_valid_session_id(&"a".repeat(65)));
        assert!(!is_valid_session_id(&"A".repeat(64)));
        assert!(!is_valid_session_id(&"g".repeat(64)));
        assert!(!is_valid_session_id(&format!("{}'; --", "a".repeat(58))));
    }
}
