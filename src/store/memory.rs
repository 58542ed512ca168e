//! In-memory store for tests and local development.
//!
//! [`MemoryStore`] keeps every collection in one `RwLock`, so each trait call
//! is a single critical section and the like guard is trivially atomic. Data
//! is lost when the store is dropped.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    HistoryEntry, Notification, NotificationId, Post, PostFilter, PostId, PostUpdate, Session,
    SessionId, User, UserId, UserUpdate,
};
use crate::store::backend::{LikeGuard, StoreBackend};
use crate::store::error::{Collection, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    posts: HashMap<PostId, Post>,
    notifications: HashMap<NotificationId, Notification>,
    sessions: HashMap<SessionId, Session>,
    history: Vec<HistoryEntry>,
}

impl Tables {
    fn user_mut(&mut self, id: UserId) -> StoreResult<&mut User> {
        self.users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(Collection::Users, id))
    }

    fn name_taken(&self, name: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.name == name && Some(u.id) != except)
    }
}

/// An in-memory implementation of [`StoreBackend`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of history entries recorded for `user`
    pub fn history_len(&self, user: UserId) -> StoreResult<usize> {
        Ok(self.read()?.history.iter().filter(|h| h.user_id == user).count())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.read()?
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Collection::Users, id))
    }

    async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.values().find(|u| u.name == name).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.read()?.users.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.users.contains_key(&user.id) {
            return Err(StoreError::conflict(Collection::Users, "id already exists"));
        }
        if tables.name_taken(&user.name, None) {
            return Err(StoreError::conflict(Collection::Users, "name already taken"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(
        &self,
        id: UserId,
        update: &UserUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        let mut tables = self.write()?;
        if let Some(name) = &update.name
            && tables.name_taken(name, Some(id))
        {
            return Err(StoreError::conflict(Collection::Users, "name already taken"));
        }
        let user = tables.user_mut(id)?;
        user.apply(update, now);
        Ok(user.clone())
    }

    async fn link_post(
        &self,
        user: UserId,
        post: PostId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let user = tables.user_mut(user)?;
        user.updated_at = now;
        if user.posts.contains(&post) {
            return Ok(false);
        }
        user.posts.push(post);
        Ok(true)
    }

    async fn unlink_post(
        &self,
        user: UserId,
        post: PostId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let user = tables.user_mut(user)?;
        let before = user.posts.len();
        user.posts.retain(|p| *p != post);
        user.updated_at = now;
        Ok(user.posts.len() != before)
    }

    async fn add_liked_post(&self, user: UserId, post: PostId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let user = tables.user_mut(user)?;
        if user.liked_posts.contains(&post) {
            return Ok(false);
        }
        user.liked_posts.push(post);
        Ok(true)
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        self.write()?
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(Collection::Users, id))
    }

    async fn get_post(&self, id: PostId) -> StoreResult<Post> {
        self.read()?
            .posts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Collection::Posts, id))
    }

    async fn find_posts(&self, filter: PostFilter) -> StoreResult<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .read()?
            .posts
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        posts.sort_by_key(|p| (p.created_at, p.id));
        Ok(posts)
    }

    async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.posts.contains_key(&post.id) {
            return Err(StoreError::conflict(Collection::Posts, "id already exists"));
        }
        tables.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn update_post(
        &self,
        id: PostId,
        update: &PostUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Post> {
        let mut tables = self.write()?;
        let post = tables
            .posts
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(Collection::Posts, id))?;
        post.apply(update, now);
        Ok(post.clone())
    }

    async fn delete_post(&self, id: PostId) -> StoreResult<()> {
        self.write()?
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(Collection::Posts, id))
    }

    async fn like_post(
        &self,
        id: PostId,
        liker: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<LikeGuard> {
        let mut tables = self.write()?;
        let post = tables
            .posts
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(Collection::Posts, id))?;
        if post.record_like(liker, now) {
            Ok(LikeGuard::Applied(post.clone()))
        } else {
            Ok(LikeGuard::AlreadyLiked)
        }
    }

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.notifications.contains_key(&notification.id) {
            return Err(StoreError::conflict(
                Collection::Notifications,
                "id already exists",
            ));
        }
        tables
            .notifications
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn find_notifications(&self, recipient: UserId) -> StoreResult<Vec<Notification>> {
        let mut found: Vec<Notification> = self
            .read()?
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient)
            .cloned()
            .collect();
        found.sort_by_key(|n| (n.created_at, n.id));
        Ok(found)
    }

    async fn delete_notifications(&self, ids: &[NotificationId]) -> StoreResult<u64> {
        let mut tables = self.write()?;
        let removed = ids
            .iter()
            .filter(|id| tables.notifications.remove(*id).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.sessions.contains_key(&session.id) {
            return Err(StoreError::conflict(Collection::Sessions, "id already exists"));
        }
        tables.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Session> {
        self.read()?
            .sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Collection::Sessions, id))
    }

    async fn touch_session(&self, id: SessionId, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.write()?;
        let session = tables
            .sessions
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(Collection::Sessions, id))?;
        session.last_activity = now;
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> StoreResult<()> {
        self.write()?
            .sessions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(Collection::Sessions, id))
    }

    async fn append_history(&self, entry: &HistoryEntry) -> StoreResult<()> {
        self.write()?.history.push(entry.clone());
        Ok(())
    }
}
