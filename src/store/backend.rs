//! The [`StoreBackend`] trait: single-record operations over the feed's record
//! collections.
//!
//! Backends carry no business rules. The only conditional write they provide
//! is [`StoreBackend::like_post`], whose check and mutation must happen as one
//! atomic step.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    HistoryEntry, Notification, NotificationId, Post, PostFilter, PostId, PostUpdate, Session,
    SessionId, User, UserId, UserUpdate,
};
use crate::store::error::StoreResult;

/// Outcome of the atomic like guard
#[derive(Debug, Clone)]
pub enum LikeGuard {
    /// The like was recorded; carries the post as written
    Applied(Post),
    /// The liker was already present; nothing was written
    AlreadyLiked,
}

/// Storage backend for feed records.
///
/// Implementations must be thread-safe. Every method touches exactly one
/// record, except [`StoreBackend::delete_notifications`], which removes the
/// given ids one by one and reports how many existed.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Cheap connectivity probe used by the health check
    async fn ping(&self) -> StoreResult<()>;

    // -- users --

    async fn get_user(&self, id: UserId) -> StoreResult<User>;

    async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<User>>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Insert a new user; fails with `Conflict` if the id or name is taken
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    /// Write only the present fields of `update` and set `updated_at = now`
    async fn update_user(
        &self,
        id: UserId,
        update: &UserUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<User>;

    /// Append `post` to the user's `posts` set and bump `updated_at`.
    ///
    /// Returns `false` if the post was already linked.
    async fn link_post(&self, user: UserId, post: PostId, now: DateTime<Utc>)
    -> StoreResult<bool>;

    /// Remove `post` from the user's `posts` set and bump `updated_at`
    async fn unlink_post(
        &self,
        user: UserId,
        post: PostId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Add `post` to the user's `liked_posts` set; `false` if already present
    async fn add_liked_post(&self, user: UserId, post: PostId) -> StoreResult<bool>;

    async fn delete_user(&self, id: UserId) -> StoreResult<()>;

    // -- posts --

    async fn get_post(&self, id: PostId) -> StoreResult<Post>;

    /// Posts matching `filter`, oldest first
    async fn find_posts(&self, filter: PostFilter) -> StoreResult<Vec<Post>>;

    async fn insert_post(&self, post: &Post) -> StoreResult<()>;

    async fn update_post(
        &self,
        id: PostId,
        update: &PostUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Post>;

    async fn delete_post(&self, id: PostId) -> StoreResult<()>;

    /// Atomically add `liker` to the post's `liked_by` set and increment
    /// `likes_count`, conditioned on `liker` not being present yet.
    async fn like_post(
        &self,
        id: PostId,
        liker: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<LikeGuard>;

    // -- notifications --

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()>;

    /// Notifications addressed to `recipient`, oldest first
    async fn find_notifications(&self, recipient: UserId) -> StoreResult<Vec<Notification>>;

    /// Delete exactly the given ids; returns how many were present
    async fn delete_notifications(&self, ids: &[NotificationId]) -> StoreResult<u64>;

    // -- sessions / history --

    async fn insert_session(&self, session: &Session) -> StoreResult<()>;

    async fn get_session(&self, id: SessionId) -> StoreResult<Session>;

    async fn touch_session(&self, id: SessionId, now: DateTime<Utc>) -> StoreResult<()>;

    async fn delete_session(&self, id: SessionId) -> StoreResult<()>;

    async fn append_history(&self, entry: &HistoryEntry) -> StoreResult<()>;
}
