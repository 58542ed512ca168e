//! Fault-injecting backend for exercising partial-failure paths.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    HistoryEntry, Notification, NotificationId, Post, PostFilter, PostId, PostUpdate, Session,
    SessionId, User, UserId, UserUpdate,
};
use crate::store::backend::{LikeGuard, StoreBackend};
use crate::store::error::{StoreError, StoreResult};
use crate::store::memory::MemoryStore;

/// [`MemoryStore`] wrapper whose operations can be made to fail or hang by name
#[derive(Default)]
pub struct FlakyBackend {
    inner: MemoryStore,
    failing: Mutex<HashSet<&'static str>>,
    stalled: Mutex<HashSet<&'static str>>,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Make `op` fail with `Unavailable` until [`FlakyBackend::heal`]
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    /// Make `op` hang far past any test deadline
    pub fn stall(&self, op: &'static str) {
        self.stalled.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
        self.stalled.lock().unwrap().remove(op);
    }

    async fn gate(&self, op: &'static str) -> StoreResult<()> {
        let stalled = self.stalled.lock().unwrap().contains(op);
        if stalled {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failing.lock().unwrap().contains(op) {
            return Err(StoreError::Unavailable(format!("injected failure: {op}")));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for FlakyBackend {
    async fn ping(&self) -> StoreResult<()> {
        self.gate("ping").await?;
        self.inner.ping().await
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.gate("get_user").await?;
        self.inner.get_user(id).await
    }

    async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<User>> {
        self.gate("find_user_by_name").await?;
        self.inner.find_user_by_name(name).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.gate("list_users").await?;
        self.inner.list_users().await
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.gate("insert_user").await?;
        self.inner.insert_user(user).await
    }

    async fn update_user(
        &self,
        id: UserId,
        update: &UserUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        self.gate("update_user").await?;
        self.inner.update_user(id, update, now).await
    }

    async fn link_post(
        &self,
        user: UserId,
        post: PostId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.gate("link_post").await?;
        self.inner.link_post(user, post, now).await
    }

    async fn unlink_post(
        &self,
        user: UserId,
        post: PostId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.gate("unlink_post").await?;
        self.inner.unlink_post(user, post, now).await
    }

    async fn add_liked_post(&self, user: UserId, post: PostId) -> StoreResult<bool> {
        self.gate("add_liked_post").await?;
        self.inner.add_liked_post(user, post).await
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        self.gate("delete_user").await?;
        self.inner.delete_user(id).await
    }

    async fn get_post(&self, id: PostId) -> StoreResult<Post> {
        self.gate("get_post").await?;
        self.inner.get_post(id).await
    }

    async fn find_posts(&self, filter: PostFilter) -> StoreResult<Vec<Post>> {
        self.gate("find_posts").await?;
        self.inner.find_posts(filter).await
    }

    async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        self.gate("insert_post").await?;
        self.inner.insert_post(post).await
    }

    async fn update_post(
        &self,
        id: PostId,
        update: &PostUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Post> {
        self.gate("update_post").await?;
        self.inner.update_post(id, update, now).await
    }

    async fn delete_post(&self, id: PostId) -> StoreResult<()> {
        self.gate("delete_post").await?;
        self.inner.delete_post(id).await
    }

    async fn like_post(
        &self,
        id: PostId,
        liker: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<LikeGuard> {
        self.gate("like_post").await?;
        self.inner.like_post(id, liker, now).await
    }

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.gate("insert_notification").await?;
        self.inner.insert_notification(notification).await
    }

    async fn find_notifications(&self, recipient: UserId) -> StoreResult<Vec<Notification>> {
        self.gate("find_notifications").await?;
        self.inner.find_notifications(recipient).await
    }

    async fn delete_notifications(&self, ids: &[NotificationId]) -> StoreResult<u64> {
        self.gate("delete_notifications").await?;
        self.inner.delete_notifications(ids).await
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        self.gate("insert_session").await?;
        self.inner.insert_session(session).await
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Session> {
        self.gate("get_session").await?;
        self.inner.get_session(id).await
    }

    async fn touch_session(&self, id: SessionId, now: DateTime<Utc>) -> StoreResult<()> {
        self.gate("touch_session").await?;
        self.inner.touch_session(id, now).await
    }

    async fn delete_session(&self, id: SessionId) -> StoreResult<()> {
        self.gate("delete_session").await?;
        self.inner.delete_session(id).await
    }

    async fn append_history(&self, entry: &HistoryEntry) -> StoreResult<()> {
        self.gate("append_history").await?;
        self.inner.append_history(entry).await
    }
}
