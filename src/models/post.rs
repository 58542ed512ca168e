use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{ERR_CONTENT_TOO_LONG, ERR_EMPTY_CONTENT, MAX_POST_CHARS};
use crate::models::{PostId, UserId};

/// Post record as persisted in the `posts` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub content: String,
    pub author_id: UserId,
    /// Always equal to `liked_by.len()`
    pub likes_count: u64,
    /// Distinct likers in the order their likes were accepted
    pub liked_by: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(content: String, author_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: PostId::new(),
            content,
            author_id,
            likes_count: 0,
            liked_by: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check post content, returning the reason it is rejected
    pub fn validate_content(content: &str) -> Result<(), &'static str> {
        if content.trim().is_empty() {
            return Err(ERR_EMPTY_CONTENT);
        }
        if content.chars().count() > MAX_POST_CHARS {
            return Err(ERR_CONTENT_TOO_LONG);
        }
        Ok(())
    }

    pub fn is_liked_by(&self, user: UserId) -> bool {
        self.liked_by.contains(&user)
    }

    /// Record a like from `user` unless one is already present.
    ///
    /// Returns `false` without touching the record when `user` already liked it.
    pub fn record_like(&mut self, user: UserId, now: DateTime<Utc>) -> bool {
        if self.is_liked_by(user) {
            return false;
        }
        self.liked_by.push(user);
        self.likes_count += 1;
        self.updated_at = now;
        true
    }

    pub fn apply(&mut self, update: &PostUpdate, now: DateTime<Utc>) {
        if let Some(content) = &update.content {
            self.content = content.clone();
        }
        self.updated_at = now;
    }
}

/// Fields a post edit may change. Like state only changes through the like
/// guard.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub content: Option<String>,
}

/// Predicate for `posts` lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    ByAuthor(UserId),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::ByAuthor(author) => post.author_id == *author,
        }
    }
}
