use chrono::Utc;

use super::Mutations;
use crate::error::{AppError, Result};
use crate::models::{Post, PostId, PostUpdate, UserId};

impl Mutations {
    /// Insert a post and link it into the author's `posts`.
    ///
    /// A failed link leaves the post in place and reports
    /// `PartialFailure` with its id. The link is not retried here.
    pub async fn create_post(&self, author: UserId, content: String) -> Result<Post> {
        Post::validate_content(&content).map_err(|msg| AppError::InvalidInput(msg.into()))?;

        let store = self.store.multi_step();
        let now = Utc::now();
        let post = Post::new(content, author, now);

        store.insert_post(&post).await?;

        if let Err(e) = store.link_post(author, post.id, now).await {
            tracing::warn!(
                post_id = %post.id,
                author_id = %author,
                "Post created but author index not updated: {}",
                e
            );
            return Err(AppError::PartialFailure {
                resource: "post",
                id: post.id.to_string(),
                reason: e.to_string(),
            });
        }

        tracing::info!(post_id = %post.id, author_id = %author, "Post created");
        Ok(post)
    }

    /// Edit a post. Only its author may do so.
    pub async fn update_post(
        &self,
        editor: UserId,
        post_id: PostId,
        update: PostUpdate,
    ) -> Result<Post> {
        if let Some(content) = &update.content {
            Post::validate_content(content).map_err(|msg| AppError::InvalidInput(msg.into()))?;
        }

        let store = self.store.multi_step();
        let post = store.get_post(post_id).await?;
        if post.author_id != editor {
            tracing::warn!(post_id = %post_id, editor = %editor, "Rejected edit by non-author");
            return Err(AppError::Forbidden);
        }

        let updated = store.update_post(post_id, &update, Utc::now()).await?;
        tracing::info!(post_id = %post_id, "Post updated");
        Ok(updated)
    }

    /// Delete a post, then unlink it from the author's `posts`.
    ///
    /// Likers' `liked_posts` keep the id.
    pub async fn delete_post(&self, editor: UserId, post_id: PostId) -> Result<()> {
        let store = self.store.multi_step();
        let post = store.get_post(post_id).await?;
        if post.author_id != editor {
            tracing::warn!(post_id = %post_id, editor = %editor, "Rejected delete by non-author");
            return Err(AppError::Forbidden);
        }

        store.delete_post(post_id).await?;

        if let Err(e) = store.unlink_post(post.author_id, post_id, Utc::now()).await {
            tracing::warn!(post_id = %post_id, "Post deleted but author index not updated: {}", e);
            return Err(AppError::PartialFailure {
                resource: "post",
                id: post_id.to_string(),
                reason: e.to_string(),
            });
        }

        tracing::info!(post_id = %post_id, "Post deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutations::test_support::{flaky_mutations, seed_user};
    use crate::store::StoreBackend;

    #[tokio::test]
    async fn test_create_then_get() {
        let (backend, mutations) = flaky_mutations();
        let author = seed_user(&mutations, "alice").await;

        let post = mutations
            .create_post(author, "hello world".into())
            .await
            .unwrap();

        let stored = mutations.store().get_post(post.id).await.unwrap();
        assert_eq!(stored.content, "hello world");
        assert_eq!(stored.likes_count, 0);
        assert!(stored.liked_by.is_empty());

        let user = backend.inner().get_user(author).await.unwrap();
        assert_eq!(user.posts, vec![post.id]);
        assert!(user.updated_at >= post.created_at);
    }

    #[tokio::test]
    async fn test_blank_content_rejected_without_writes() {
        let (backend, mutations) = flaky_mutations();
        let author = seed_user(&mutations, "alice").await;

        let err = mutations.create_post(author, "   \n".into()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(
            backend
                .inner()
                .find_posts(crate::models::PostFilter::All)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_link_failure_reports_partial_failure() {
        let (backend, mutations) = flaky_mutations();
        let author = seed_user(&mutations, "alice").await;
        backend.fail("link_post");

        let err = mutations
            .create_post(author, "orphan".into())
            .await
            .unwrap_err();

        let (resource, id) = match err {
            AppError::PartialFailure { resource, id, .. } => (resource, id),
            other => panic!("expected partial failure, got {other:?}"),
        };
        assert_eq!(resource, "post");

        // The post exists; the author index does not mention it
        let post_id = PostId::parse(&id).unwrap();
        assert!(backend.inner().get_post(post_id).await.is_ok());
        assert!(backend.inner().get_user(author).await.unwrap().posts.is_empty());
    }

    #[tokio::test]
    async fn test_insert_failure_is_hard_failure() {
        let (backend, mutations) = flaky_mutations();
        let author = seed_user(&mutations, "alice").await;
        backend.fail("insert_post");

        let err = mutations.create_post(author, "lost".into()).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
        assert!(backend.inner().get_user(author).await.unwrap().posts.is_empty());
    }

    #[tokio::test]
    async fn test_only_author_may_edit_or_delete() {
        let (_backend, mutations) = flaky_mutations();
        let author = seed_user(&mutations, "alice").await;
        let other = seed_user(&mutations, "bob").await;
        let post = mutations.create_post(author, "mine".into()).await.unwrap();

        let edit = PostUpdate {
            content: Some("yours now".into()),
        };
        assert!(matches!(
            mutations.update_post(other, post.id, edit.clone()).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            mutations.delete_post(other, post.id).await,
            Err(AppError::Forbidden)
        ));

        let updated = mutations.update_post(author, post.id, edit).await.unwrap();
        assert_eq!(updated.content, "yours now");
    }

    #[tokio::test]
    async fn test_delete_unlinks_from_author() {
        let (backend, mutations) = flaky_mutations();
        let author = seed_user(&mutations, "alice").await;
        let post = mutations.create_post(author, "bye".into()).await.unwrap();

        mutations.delete_post(author, post.id).await.unwrap();

        assert!(backend.inner().get_post(post.id).await.unwrap_err().is_not_found());
        assert!(backend.inner().get_user(author).await.unwrap().posts.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_post_is_not_found() {
        let (_backend, mutations) = flaky_mutations();
        let author = seed_user(&mutations, "alice").await;
        assert!(matches!(
            mutations.delete_post(author, PostId::new()).await,
            Err(AppError::NotFound("Post"))
        ));
    }
}
