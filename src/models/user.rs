use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_NAME_CHARS, MAX_PASSWORD_CHARS, MIN_PASSWORD_CHARS};
use crate::models::{PostId, UserId};

/// Profile picture stored inline on the user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// User record as persisted in the `users` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub password_hash: String,
    pub avatar: Option<Avatar>,
    /// Posts authored by this user, in creation order
    pub posts: Vec<PostId>,
    /// Posts this user has liked; never contains duplicates
    pub liked_posts: Vec<PostId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh user record with empty post indexes
    pub fn new(name: String, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name,
            password_hash,
            avatar: None,
            posts: Vec::new(),
            liked_posts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate a display/login name
    pub fn validate_name(name: &str) -> bool {
        let len = name.chars().count();
        len > 0 && len <= MAX_NAME_CHARS && name.trim() == name
    }

    /// Validate a plaintext password before hashing
    pub fn validate_password(password: &str) -> bool {
        let len = password.chars().count();
        (MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&len)
    }

    /// Apply the present fields of `update` and refresh `updated_at`
    pub fn apply(&mut self, update: &UserUpdate, now: DateTime<Utc>) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(hash) = &update.password_hash {
            self.password_hash = hash.clone();
        }
        if let Some(avatar) = &update.avatar {
            self.avatar = Some(avatar.clone());
        }
        self.updated_at = now;
    }
}

/// Fields a profile edit may change; `None` means "leave untouched"
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub avatar: Option<Avatar>,
}

/// Public view of a user for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub avatar: String,
    pub posts: Vec<PostId>,
    pub liked_posts: Vec<PostId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            avatar: format!("/api/v1/users/{}/avatar", user.id),
            posts: user.posts.clone(),
            liked_posts: user.liked_posts.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
