use serde::Serialize;

use super::Mutations;
use crate::error::Result;
use crate::models::{Notification, NotificationId, UserId};

/// Notifications delivered by one read-and-clear
#[derive(Debug, Clone, Serialize)]
pub struct NotificationBatch {
    pub notifications: Vec<Notification>,
    /// False when delivery succeeded but the records could not be removed
    pub purged: bool,
}

impl Mutations {
    /// Fetch the recipient's notifications, then delete exactly those.
    ///
    /// Anything inserted between the fetch and the delete is left for the
    /// next call.
    pub async fn read_and_clear_notifications(&self, recipient: UserId) -> Result<NotificationBatch> {
        let store = self.store.multi_step();
        let notifications = store.find_notifications(recipient).await?;

        if notifications.is_empty() {
            return Ok(NotificationBatch {
                notifications,
                purged: true,
            });
        }

        let ids: Vec<NotificationId> = notifications.iter().map(|n| n.id).collect();
        let purged = match store.delete_notifications(&ids).await {
            Ok(removed) => {
                tracing::info!(recipient = %recipient, removed, "Notifications delivered");
                true
            }
            Err(e) => {
                tracing::warn!(
                    recipient = %recipient,
                    count = ids.len(),
                    "Notifications delivered but not purged: {}",
                    e
                );
                false
            }
        };

        Ok(NotificationBatch {
            notifications,
            purged,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::error::AppError;
    use crate::models::PostId;
    use crate::mutations::test_support::{flaky_mutations, seed_user};
    use crate::store::StoreBackend;

    #[tokio::test]
    async fn test_second_read_is_empty() {
        let (_backend, mutations) = flaky_mutations();
        let author = seed_user(&mutations, "alice").await;
        let liker = seed_user(&mutations, "bob").await;
        let post = mutations.create_post(author, "hi".into()).await.unwrap();
        mutations.like_post(post.id, liker).await.unwrap();

        let first = mutations.read_and_clear_notifications(author).await.unwrap();
        assert_eq!(first.notifications.len(), 1);
        assert!(first.purged);

        let second = mutations.read_and_clear_notifications(author).await.unwrap();
        assert!(second.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_late_notification_survives_to_next_read() {
        let (backend, mutations) = flaky_mutations();
        let author = seed_user(&mutations, "alice").await;
        let liker = seed_user(&mutations, "bob").await;

        backend
            .inner()
            .insert_notification(&Notification::like(PostId::new(), liker, author, Utc::now()))
            .await
            .unwrap();
        mutations.read_and_clear_notifications(author).await.unwrap();

        let late = Notification::like(PostId::new(), liker, author, Utc::now());
        backend.inner().insert_notification(&late).await.unwrap();

        let batch = mutations.read_and_clear_notifications(author).await.unwrap();
        assert_eq!(batch.notifications.len(), 1);
        assert_eq!(batch.notifications[0].id, late.id);
    }

    #[tokio::test]
    async fn test_only_recipient_notifications_are_cleared() {
        let (backend, mutations) = flaky_mutations();
        let alice = seed_user(&mutations, "alice").await;
        let bob = seed_user(&mutations, "bob").await;

        let for_alice = Notification::like(PostId::new(), bob, alice, Utc::now());
        let for_bob = Notification::like(PostId::new(), alice, bob, Utc::now());
        backend.inner().insert_notification(&for_alice).await.unwrap();
        backend.inner().insert_notification(&for_bob).await.unwrap();

        let batch = mutations.read_and_clear_notifications(alice).await.unwrap();
        assert_eq!(batch.notifications.len(), 1);
        assert_eq!(backend.inner().find_notifications(bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_records_for_redelivery() {
        let (backend, mutations) = flaky_mutations();
        let author = seed_user(&mutations, "alice").await;
        let liker = seed_user(&mutations, "bob").await;
        let post = mutations.create_post(author, "hi".into()).await.unwrap();
        mutations.like_post(post.id, liker).await.unwrap();
        backend.fail("delete_notifications");

        let batch = mutations.read_and_clear_notifications(author).await.unwrap();
        assert_eq!(batch.notifications.len(), 1);
        assert!(!batch.purged);

        backend.heal("delete_notifications");
        let again = mutations.read_and_clear_notifications(author).await.unwrap();
        assert_eq!(again.notifications.len(), 1);
        assert!(again.purged);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_hard_failure() {
        let (backend, mutations) = flaky_mutations();
        let author = seed_user(&mutations, "alice").await;
        backend.fail("find_notifications");

        assert!(matches!(
            mutations.read_and_clear_notifications(author).await,
            Err(AppError::StoreUnavailable(_))
        ));
    }
}
