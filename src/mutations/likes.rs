use chrono::Utc;
use serde::Serialize;

use super::Mutations;
use crate::error::{AppError, Result};
use crate::models::{Notification, PostId, UserId};
use crate::store::LikeGuard;

/// Whether the liker's `liked_posts` picked up the new like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIndex {
    Synced,
    Lagging,
}

/// Outcome of an accepted like
#[derive(Debug, Clone, Serialize)]
pub struct LikeReceipt {
    pub post_id: PostId,
    pub likes_count: u64,
    pub user_index: UserIndex,
    pub notified: bool,
}

impl Mutations {
    /// Like a post on behalf of `liker`.
    ///
    /// The like guard is the commit point. After it succeeds the like stands
    /// regardless of what happens to the liker's index or the notification.
    pub async fn like_post(&self, post_id: PostId, liker: UserId) -> Result<LikeReceipt> {
        let store = self.store.multi_step();
        let now = Utc::now();

        let post = match store.like_post(post_id, liker, now).await? {
            LikeGuard::Applied(post) => post,
            LikeGuard::AlreadyLiked => {
                tracing::warn!(post_id = %post_id, liker = %liker, "Duplicate like rejected");
                return Err(AppError::AlreadyLiked);
            }
        };

        let user_index = match store.add_liked_post(liker, post_id).await {
            Ok(_) => UserIndex::Synced,
            Err(e) => {
                tracing::warn!(
                    post_id = %post_id,
                    liker = %liker,
                    "Like recorded but liked_posts not updated: {}",
                    e
                );
                UserIndex::Lagging
            }
        };

        let notification = Notification::like(post_id, liker, post.author_id, now);
        let notified = match store.insert_notification(&notification).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    post_id = %post_id,
                    recipient = %post.author_id,
                    "Like notification dropped: {}",
                    e
                );
                false
            }
        };

        tracing::info!(post_id = %post_id, liker = %liker, likes = post.likes_count, "Post liked");

        Ok(LikeReceipt {
            post_id,
            likes_count: post.likes_count,
            user_index,
            notified,
        })
    }
}
