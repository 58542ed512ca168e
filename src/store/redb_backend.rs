//! Durable [`StoreBackend`] on top of redb.
//!
//! Records are bincode-encoded and keyed by their id string. Every trait call
//! runs one redb transaction on the blocking pool. redb serializes write
//! transactions, which is what makes the read-check-write inside
//! [`RedbStore::like_post`] atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Serialize, de::DeserializeOwned};

use crate::db::{Db, open_database, tables};
use crate::models::{
    HistoryEntry, Notification, NotificationId, Post, PostFilter, PostId, PostUpdate, Session,
    SessionId, User, UserId, UserUpdate,
};
use crate::store::backend::{LikeGuard, StoreBackend};
use crate::store::error::{Collection, StoreError, StoreResult};

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(value)
}

fn get_record<T: DeserializeOwned>(
    db: &Database,
    def: RecordTable,
    collection: Collection,
    key: &str,
) -> StoreResult<T> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(def)?;
    let record = match table.get(key)? {
        Some(bytes) => decode(bytes.value())?,
        None => return Err(StoreError::not_found(collection, key)),
    };
    Ok(record)
}

fn scan<T: DeserializeOwned>(
    db: &Database,
    def: RecordTable,
    mut keep: impl FnMut(&T) -> bool,
) -> StoreResult<Vec<T>> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(def)?;
    let mut found = Vec::new();
    for entry in table.iter()? {
        let (_, bytes) = entry?;
        let record: T = decode(bytes.value())?;
        if keep(&record) {
            found.push(record);
        }
    }
    Ok(found)
}

fn insert_new<T: Serialize>(
    db: &Database,
    def: RecordTable,
    collection: Collection,
    key: &str,
    record: &T,
) -> StoreResult<()> {
    let bytes = encode(record)?;
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(def)?;
        if table.get(key)?.is_some() {
            return Err(StoreError::conflict(collection, "id already exists"));
        }
        table.insert(key, bytes.as_slice())?;
    }
    write_txn.commit()?;
    Ok(())
}

/// Read-modify-write of one record inside a single write transaction.
///
/// `f` returns its result plus whether the record changed; unchanged records
/// are not written back.
fn modify<T, R>(
    db: &Database,
    def: RecordTable,
    collection: Collection,
    key: &str,
    f: impl FnOnce(&mut T) -> (R, bool),
) -> StoreResult<R>
where
    T: Serialize + DeserializeOwned,
{
    let write_txn = db.begin_write()?;
    let result = {
        let mut table = write_txn.open_table(def)?;
        let mut record: T = match table.get(key)? {
            Some(bytes) => decode(bytes.value())?,
            None => return Err(StoreError::not_found(collection, key)),
        };
        let (result, changed) = f(&mut record);
        if !changed {
            drop(table);
            write_txn.abort()?;
            return Ok(result);
        }
        let bytes = encode(&record)?;
        table.insert(key, bytes.as_slice())?;
        result
    };
    write_txn.commit()?;
    Ok(result)
}

fn remove(db: &Database, def: RecordTable, collection: Collection, key: &str) -> StoreResult<()> {
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(def)?;
        if table.remove(key)?.is_none() {
            return Err(StoreError::not_found(collection, key));
        }
    }
    write_txn.commit()?;
    Ok(())
}

/// redb-backed implementation of [`StoreBackend`]
#[derive(Clone)]
pub struct RedbStore {
    db: Db,
}

impl RedbStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Open (or create) the database file and wrap it
    pub fn open(path: impl AsRef<std::path::Path>) -> StoreResult<Self> {
        Ok(Self::new(open_database(path)?))
    }

    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }
}

#[async_trait]
impl StoreBackend for RedbStore {
    async fn ping(&self) -> StoreResult<()> {
        self.blocking(|db| {
            db.begin_read()?;
            Ok(())
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.blocking(move |db| get_record(db, tables::USERS, Collection::Users, &id.key()))
            .await
    }

    async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<User>> {
        let name = name.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let names = read_txn.open_table(tables::USER_NAMES)?;
            let Some(user_key) = names.get(name.as_str())?.map(|v| v.value().to_string()) else {
                return Ok(None);
            };
            let users = read_txn.open_table(tables::USERS)?;
            let user = users
                .get(user_key.as_str())?
                .map(|bytes| decode::<User>(bytes.value()))
                .transpose()?;
            Ok(user)
        })
        .await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.blocking(|db| {
            let mut users: Vec<User> = scan(db, tables::USERS, |_| true)?;
            users.sort_by_key(|u| (u.created_at, u.id));
            Ok(users)
        })
        .await
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let user = user.clone();
        self.blocking(move |db| {
            let key = user.id.key();
            let bytes = encode(&user)?;
            let write_txn = db.begin_write()?;
            {
                let mut names = write_txn.open_table(tables::USER_NAMES)?;
                if names.get(user.name.as_str())?.is_some() {
                    return Err(StoreError::conflict(Collection::Users, "name already taken"));
                }
                let mut users = write_txn.open_table(tables::USERS)?;
                if users.get(key.as_str())?.is_some() {
                    return Err(StoreError::conflict(Collection::Users, "id already exists"));
                }
                users.insert(key.as_str(), bytes.as_slice())?;
                names.insert(user.name.as_str(), key.as_str())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn update_user(
        &self,
        id: UserId,
        update: &UserUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        let update = update.clone();
        self.blocking(move |db| {
            let key = id.key();
            let write_txn = db.begin_write()?;
            let user = {
                let mut users = write_txn.open_table(tables::USERS)?;
                let mut user: User = match users.get(key.as_str())? {
                    Some(bytes) => decode(bytes.value())?,
                    None => return Err(StoreError::not_found(Collection::Users, &key)),
                };

                if let Some(new_name) = &update.name
                    && *new_name != user.name
                {
                    let mut names = write_txn.open_table(tables::USER_NAMES)?;
                    if names.get(new_name.as_str())?.is_some() {
                        return Err(StoreError::conflict(Collection::Users, "name already taken"));
                    }
                    names.remove(user.name.as_str())?;
                    names.insert(new_name.as_str(), key.as_str())?;
                }

                user.apply(&update, now);
                let bytes = encode(&user)?;
                users.insert(key.as_str(), bytes.as_slice())?;
                user
            };
            write_txn.commit()?;
            Ok(user)
        })
        .await
    }

    async fn link_post(
        &self,
        user: UserId,
        post: PostId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.blocking(move |db| {
            modify(db, tables::USERS, Collection::Users, &user.key(), |u: &mut User| {
                u.updated_at = now;
                if u.posts.contains(&post) {
                    return (false, true);
                }
                u.posts.push(post);
                (true, true)
            })
        })
        .await
    }

    async fn unlink_post(
        &self,
        user: UserId,
        post: PostId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.blocking(move |db| {
            modify(db, tables::USERS, Collection::Users, &user.key(), |u: &mut User| {
                let before = u.posts.len();
                u.posts.retain(|p| *p != post);
                u.updated_at = now;
                (u.posts.len() != before, true)
            })
        })
        .await
    }

    async fn add_liked_post(&self, user: UserId, post: PostId) -> StoreResult<bool> {
        self.blocking(move |db| {
            modify(db, tables::USERS, Collection::Users, &user.key(), |u: &mut User| {
                if u.liked_posts.contains(&post) {
                    return (false, false);
                }
                u.liked_posts.push(post);
                (true, true)
            })
        })
        .await
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        self.blocking(move |db| {
            let key = id.key();
            let write_txn = db.begin_write()?;
            {
                let mut users = write_txn.open_table(tables::USERS)?;
                let user: User = match users.remove(key.as_str())? {
                    Some(bytes) => decode(bytes.value())?,
                    None => return Err(StoreError::not_found(Collection::Users, &key)),
                };
                let mut names = write_txn.open_table(tables::USER_NAMES)?;
                names.remove(user.name.as_str())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_post(&self, id: PostId) -> StoreResult<Post> {
        self.blocking(move |db| get_record(db, tables::POSTS, Collection::Posts, &id.key()))
            .await
    }

    async fn find_posts(&self, filter: PostFilter) -> StoreResult<Vec<Post>> {
        self.blocking(move |db| {
            let mut posts: Vec<Post> = scan(db, tables::POSTS, |p| filter.matches(p))?;
            posts.sort_by_key(|p| (p.created_at, p.id));
            Ok(posts)
        })
        .await
    }

    async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        let post = post.clone();
        self.blocking(move |db| {
            insert_new(db, tables::POSTS, Collection::Posts, &post.id.key(), &post)
        })
        .await
    }

    async fn update_post(
        &self,
        id: PostId,
        update: &PostUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Post> {
        let update = update.clone();
        self.blocking(move |db| {
            modify(db, tables::POSTS, Collection::Posts, &id.key(), |p: &mut Post| {
                p.apply(&update, now);
                (p.clone(), true)
            })
        })
        .await
    }

    async fn delete_post(&self, id: PostId) -> StoreResult<()> {
        self.blocking(move |db| remove(db, tables::POSTS, Collection::Posts, &id.key()))
            .await
    }

    async fn like_post(
        &self,
        id: PostId,
        liker: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<LikeGuard> {
        self.blocking(move |db| {
            modify(db, tables::POSTS, Collection::Posts, &id.key(), |p: &mut Post| {
                if p.record_like(liker, now) {
                    (LikeGuard::Applied(p.clone()), true)
                } else {
                    (LikeGuard::AlreadyLiked, false)
                }
            })
        })
        .await
    }

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        let notification = notification.clone();
        self.blocking(move |db| {
            insert_new(
                db,
                tables::NOTIFICATIONS,
                Collection::Notifications,
                &notification.id.key(),
                &notification,
            )
        })
        .await
    }

    async fn find_notifications(&self, recipient: UserId) -> StoreResult<Vec<Notification>> {
        self.blocking(move |db| {
            let mut found: Vec<Notification> =
                scan(db, tables::NOTIFICATIONS, |n: &Notification| {
                    n.recipient_id == recipient
                })?;
            found.sort_by_key(|n| (n.created_at, n.id));
            Ok(found)
        })
        .await
    }

    async fn delete_notifications(&self, ids: &[NotificationId]) -> StoreResult<u64> {
        let ids = ids.to_vec();
        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            let mut removed = 0;
            {
                let mut table = write_txn.open_table(tables::NOTIFICATIONS)?;
                for id in &ids {
                    if table.remove(id.key().as_str())?.is_some() {
                        removed += 1;
                    }
                }
            }
            write_txn.commit()?;
            Ok(removed)
        })
        .await
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        let session = session.clone();
        self.blocking(move |db| {
            insert_new(
                db,
                tables::SESSIONS,
                Collection::Sessions,
                &session.id.key(),
                &session,
            )
        })
        .await
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Session> {
        self.blocking(move |db| {
            get_record(db, tables::SESSIONS, Collection::Sessions, &id.key())
        })
        .await
    }

    async fn touch_session(&self, id: SessionId, now: DateTime<Utc>) -> StoreResult<()> {
        self.blocking(move |db| {
            modify(db, tables::SESSIONS, Collection::Sessions, &id.key(), |s: &mut Session| {
                s.last_activity = now;
                ((), true)
            })
        })
        .await
    }

    async fn delete_session(&self, id: SessionId) -> StoreResult<()> {
        self.blocking(move |db| remove(db, tables::SESSIONS, Collection::Sessions, &id.key()))
            .await
    }

    async fn append_history(&self, entry: &HistoryEntry) -> StoreResult<()> {
        let entry = entry.clone();
        self.blocking(move |db| {
            insert_new(db, tables::HISTORY, Collection::History, &entry.id.key(), &entry)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Avatar;
    use tempfile::TempDir;

    fn open_store(temp_dir: &TempDir) -> RedbStore {
        RedbStore::open(temp_dir.path().join("test.redb")).expect("Failed to open test store")
    }

    #[tokio::test]
    async fn test_user_roundtrip_and_name_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        let alice = User::new("alice".into(), "hash".into(), Utc::now());
        store.insert_user(&alice).await.unwrap();

        let fetched = store.get_user(alice.id).await.unwrap();
        assert_eq!(fetched.name, "alice");
        assert_eq!(fetched.created_at, alice.created_at);

        let by_name = store.find_user_by_name("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, alice.id);
        assert!(store.find_user_by_name("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        store
            .insert_user(&User::new("alice".into(), "h".into(), Utc::now()))
            .await
            .unwrap();

        let err = store
            .insert_user(&User::new("alice".into(), "h".into(), Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_rename_moves_name_index() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        let alice = User::new("alice".into(), "h".into(), Utc::now());
        store.insert_user(&alice).await.unwrap();

        let update = UserUpdate {
            name: Some("alicia".into()),
            ..Default::default()
        };
        store.update_user(alice.id, &update, Utc::now()).await.unwrap();

        assert!(store.find_user_by_name("alice").await.unwrap().is_none());
        assert_eq!(
            store.find_user_by_name("alicia").await.unwrap().unwrap().id,
            alice.id
        );
        // The old name is free again
        store
            .insert_user(&User::new("alice".into(), "h".into(), Utc::now()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_name_only_update_preserves_avatar_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        let mut alice = User::new("alice".into(), "h".into(), Utc::now());
        let avatar = Avatar {
            content_type: "image/jpeg".into(),
            data: (0..=255).collect(),
        };
        alice.avatar = Some(avatar.clone());
        store.insert_user(&alice).await.unwrap();

        let update = UserUpdate {
            name: Some("X".into()),
            ..Default::default()
        };
        store.update_user(alice.id, &update, Utc::now()).await.unwrap();

        let stored = store.get_user(alice.id).await.unwrap();
        assert_eq!(stored.name, "X");
        assert_eq!(stored.avatar, Some(avatar));
    }

    #[tokio::test]
    async fn test_like_guard_is_conditional() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        let post = Post::new("hello".into(), UserId::new(), Utc::now());
        store.insert_post(&post).await.unwrap();
        let liker = UserId::new();

        assert!(matches!(
            store.like_post(post.id, liker, Utc::now()).await.unwrap(),
            LikeGuard::Applied(_)
        ));
        assert!(matches!(
            store.like_post(post.id, liker, Utc::now()).await.unwrap(),
            LikeGuard::AlreadyLiked
        ));

        let stored = store.get_post(post.id).await.unwrap();
        assert_eq!(stored.likes_count, 1);
        assert_eq!(stored.liked_by, vec![liker]);
    }

    #[tokio::test]
    async fn test_notifications_filtered_by_recipient() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        let recipient = UserId::new();
        let mine = Notification::like(PostId::new(), UserId::new(), recipient, Utc::now());
        let other = Notification::like(PostId::new(), recipient, UserId::new(), Utc::now());
        store.insert_notification(&mine).await.unwrap();
        store.insert_notification(&other).await.unwrap();

        let found = store.find_notifications(recipient).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, mine.id);

        assert_eq!(store.delete_notifications(&[mine.id]).await.unwrap(), 1);
        assert!(store.find_notifications(recipient).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        let session = Session::new(UserId::new(), chrono::Duration::hours(1), Utc::now());
        store.insert_session(&session).await.unwrap();

        let later = Utc::now() + chrono::Duration::minutes(5);
        store.touch_session(session.id, later).await.unwrap();
        assert_eq!(store.get_session(session.id).await.unwrap().last_activity, later);

        store.delete_session(session.id).await.unwrap();
        assert!(store.get_session(session.id).await.unwrap_err().is_not_found());
    }
}
