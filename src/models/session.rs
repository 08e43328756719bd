use chrono::{DateTime, Utc};

/// A stored session row.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// The session identifier (64 lowercase hex characters).
    pub id: String,
    /// The serialized `SessionUser` payload.
    pub data: String,
    /// The instant the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A session is logically absent once `now >= expires_at`, even if the
    /// row has not been physically removed yet.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: "a".repeat(64),
            data: String::new(),
            expires_at,
        }
    }

    #[test]
    fn valid_until_the_expiry_instant() {
        let t0 = Utc::now();
        let rec = record(t0 + Duration::days(7));

        assert!(!rec.is_expired_at(t0 + Duration::days(7) - Duration::seconds(1)));
        assert!(rec.is_expired_at(t0 + Duration::days(7)));
        assert!(rec.is_expired_at(t0 + Duration::days(7) + Duration::seconds(1)));
    }
}
