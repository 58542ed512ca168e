use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{HistoryId, SessionId, UserId};

/// Login session referenced by the `sid` claim of issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            created_at: now,
            expires_at: now + ttl,
            last_activity: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Append-only audit entry written on authenticated activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: HistoryId::new(),
            user_id,
            timestamp: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session::new(UserId::new(), Duration::seconds(60), now);

        assert!(!session.is_expired(now));
        assert!(!session.is_expired(now + Duration::seconds(59)));
        assert!(session.is_expired(now + Duration::seconds(60)));
    }
}
