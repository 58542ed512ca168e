//! Record storage for the feed.
//!
//! [`StoreBackend`] is the single-record CRUD port; [`Store`] is the handle the
//! rest of the crate uses. It bounds every call with a deadline and turns an
//! expired deadline into [`StoreError::Timeout`].

pub mod backend;
pub mod error;
pub mod memory;
pub mod redb_backend;
#[cfg(test)]
pub mod testing;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::models::{
    HistoryEntry, Notification, NotificationId, Post, PostFilter, PostId, PostUpdate, Session,
    SessionId, User, UserId, UserUpdate,
};

pub use backend::{LikeGuard, StoreBackend};
pub use error::{Collection, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redb_backend::RedbStore;

/// Deadlines applied to store calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Upper bound for any single call
    pub point: Duration,
    /// Upper bound for all calls made by one multi-step mutation
    pub multi_step: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            point: Duration::from_millis(crate::constants::DEFAULT_POINT_TIMEOUT_MS),
            multi_step: Duration::from_millis(crate::constants::DEFAULT_MULTI_STEP_TIMEOUT_MS),
        }
    }
}

/// Deadline-enforcing handle over a [`StoreBackend`].
///
/// Cloning is cheap. [`Store::multi_step`] returns a handle whose calls share
/// one overall budget: each call gets `min(point, remaining)`, and once the
/// budget is spent calls fail with `Timeout` without reaching the backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StoreBackend>,
    timeouts: Timeouts,
    deadline: Option<Instant>,
}

impl Store {
    pub fn new(backend: Arc<dyn StoreBackend>, timeouts: Timeouts) -> Self {
        Self {
            backend,
            timeouts,
            deadline: None,
        }
    }

    /// Store backed by a fresh [`MemoryStore`]
    pub fn in_memory(timeouts: Timeouts) -> Self {
        Self::new(Arc::new(MemoryStore::new()), timeouts)
    }

    /// Handle for one multi-step mutation, starting its budget now
    pub fn multi_step(&self) -> Store {
        Store {
            backend: self.backend.clone(),
            timeouts: self.timeouts,
            deadline: Some(Instant::now() + self.timeouts.multi_step),
        }
    }

    fn budget(&self, op: &'static str) -> StoreResult<Duration> {
        let Some(deadline) = self.deadline else {
            return Ok(self.timeouts.point);
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            tracing::warn!(op, "Multi-step deadline already spent");
            return Err(StoreError::Timeout { op });
        }
        Ok(remaining.min(self.timeouts.point))
    }

    async fn run<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        let budget = self.budget(op)?;
        match tokio::time::timeout(budget, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, budget_ms = budget.as_millis() as u64, "Store call timed out");
                Err(StoreError::Timeout { op })
            }
        }
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.run("ping", self.backend.ping()).await
    }

    pub async fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.run("get_user", self.backend.get_user(id)).await
    }

    pub async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<User>> {
        self.run("find_user_by_name", self.backend.find_user_by_name(name))
            .await
    }

    pub async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.run("list_users", self.backend.list_users()).await
    }

    pub async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.run("insert_user", self.backend.insert_user(user)).await
    }

    pub async fn update_user(
        &self,
        id: UserId,
        update: &UserUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        self.run("update_user", self.backend.update_user(id, update, now))
            .await
    }

    pub async fn link_post(
        &self,
        user: UserId,
        post: PostId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.run("link_post", self.backend.link_post(user, post, now))
            .await
    }

    pub async fn unlink_post(
        &self,
        user: UserId,
        post: PostId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.run("unlink_post", self.backend.unlink_post(user, post, now))
            .await
    }

    pub async fn add_liked_post(&self, user: UserId, post: PostId) -> StoreResult<bool> {
        self.run("add_liked_post", self.backend.add_liked_post(user, post))
            .await
    }

    pub async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        self.run("delete_user", self.backend.delete_user(id)).await
    }

    pub async fn get_post(&self, id: PostId) -> StoreResult<Post> {
        self.run("get_post", self.backend.get_post(id)).await
    }

    pub async fn find_posts(&self, filter: PostFilter) -> StoreResult<Vec<Post>> {
        self.run("find_posts", self.backend.find_posts(filter)).await
    }

    pub async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        self.run("insert_post", self.backend.insert_post(post)).await
    }

    pub async fn update_post(
        &self,
        id: PostId,
        update: &PostUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Post> {
        self.run("update_post", self.backend.update_post(id, update, now))
            .await
    }

    pub async fn delete_post(&self, id: PostId) -> StoreResult<()> {
        self.run("delete_post", self.backend.delete_post(id)).await
    }

    pub async fn like_post(
        &self,
        id: PostId,
        liker: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<LikeGuard> {
        self.run("like_post", self.backend.like_post(id, liker, now))
            .await
    }

    pub async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.run(
            "insert_notification",
            self.backend.insert_notification(notification),
        )
        .await
    }

    pub async fn find_notifications(&self, recipient: UserId) -> StoreResult<Vec<Notification>> {
        self.run(
            "find_notifications",
            self.backend.find_notifications(recipient),
        )
        .await
    }

    pub async fn delete_notifications(&self, ids: &[NotificationId]) -> StoreResult<u64> {
        self.run(
            "delete_notifications",
            self.backend.delete_notifications(ids),
        )
        .await
    }

    pub async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        self.run("insert_session", self.backend.insert_session(session))
            .await
    }

    pub async fn get_session(&self, id: SessionId) -> StoreResult<Session> {
        self.run("get_session", self.backend.get_session(id)).await
    }

    pub async fn touch_session(&self, id: SessionId, now: DateTime<Utc>) -> StoreResult<()> {
        self.run("touch_session", self.backend.touch_session(id, now))
            .await
    }

    pub async fn delete_session(&self, id: SessionId) -> StoreResult<()> {
        self.run("delete_session", self.backend.delete_session(id))
            .await
    }

    pub async fn append_history(&self, entry: &HistoryEntry) -> StoreResult<()> {
        self.run("append_history", self.backend.append_history(entry))
            .await
    }
}
