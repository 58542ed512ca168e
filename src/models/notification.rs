use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{NotificationId, PostId, UserId};

/// Closed set of notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
}

/// Notification record as persisted in the `notifications` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub post_id: PostId,
    /// The user whose like produced this notification
    pub liked_by: UserId,
    /// The user this notification is addressed to (the post's author)
    pub recipient_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn like(post_id: PostId, liked_by: UserId, recipient_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId::new(),
            kind: NotificationKind::Like,
            post_id,
            liked_by,
            recipient_id,
            created_at: now,
        }
    }
}
