use chrono::Utc;
use sea_orm::{DatabaseConnection, TransactionTrait};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    entity::prelude::*,
    ids::{PostId, UserId},
    media::{MediaError, MediaStore},
    validation::{FieldErrors, PostDraft, ValidationError},
};

#[derive(Debug, Error)]
pub enum PostsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("media storage failed")]
    Media(#[from] MediaError),

    #[error("post not found")]
    PostNotFound,

    #[error("unauthorized: not post author")]
    NotAuthor,

    #[error("invalid post form: {0}")]
    Invalid(FieldErrors),
}

#[derive(Clone)]
pub struct PostsService {
    db: DatabaseConnection,
    media: MediaStore,
    max_image_bytes: u64,
}

impl PostsService {
    pub fn new(db: DatabaseConnection, media: MediaStore, max_image_bytes: u64) -> Self {
        Self {
            db,
            media,
            max_image_bytes,
        }
    }

    /// Runs the form checks, including the ones that need the database.
    async fn validate_draft(&self, draft: &PostDraft) -> Result<(), PostsServiceError> {
        let mut errors = draft.validate(self.max_image_bytes);

        if let Some(group_id) = draft.group_id {
            let group_exists = Group::find_by_id(group_id).one(&self.db).await?.is_some();
            if !group_exists {
                errors.add("group", ValidationError::UnknownGroup);
            }
        }

        errors.into_result().map_err(PostsServiceError::Invalid)
    }

    /// Passes the write result through, deleting the image stored for it
    /// when the row was not written.
    async fn keep_image_if_saved<T>(
        &self,
        written: Result<T, DbErr>,
        image: Option<&str>,
    ) -> Result<T, PostsServiceError> {
        if written.is_err() {
            if let Some(path) = image {
                debug!(path = %path, "dropping image of unsaved post");
                self.media.remove(path).await;
            }
        }
        Ok(written?)
    }

    /// Create a new post authored by `author_id`
    pub async fn create_post(
        &self,
        author_id: UserId,
        draft: PostDraft,
    ) -> Result<PostModel, PostsServiceError> {
        self.validate_draft(&draft).await?;

        let image = match &draft.image {
            Some(upload) => Some(self.media.save_post_image(upload).await?),
            None => None,
        };

        let post = PostActiveModel {
            id: Set(PostId::new()),
            text: Set(draft.text),
            created_at: Set(Utc::now()),
            author_id: Set(author_id),
            group_id: Set(draft.group_id),
            image: Set(image.clone()),
        };

        let inserted = Post::insert(post).exec_with_returning(&self.db).await;
        let post = self.keep_image_if_saved(inserted, image.as_deref()).await?;
        info!(post = %post.id, author = %author_id, "post created");
        Ok(post)
    }

    /// Get a specific post by ID
    pub async fn get_post(&self, post_id: PostId) -> Result<PostModel, PostsServiceError> {
        Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(PostsServiceError::PostNotFound)
    }

    /// Fetches the post and checks that `user_id` wrote it.
    pub async fn authored_post(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<PostModel, PostsServiceError> {
        let post = self.get_post(post_id).await?;

        if post.author_id != user_id {
            debug!(post = %post_id, user = %user_id, "rejected non-author access");
            return Err(PostsServiceError::NotAuthor);
        }

        Ok(post)
    }

    /// Update a post (only by author). A draft without an image keeps the
    /// current one.
    pub async fn update_post(
        &self,
        post_id: PostId,
        editor_id: UserId,
        draft: PostDraft,
    ) -> Result<PostModel, PostsServiceError> {
        let post = self.authored_post(post_id, editor_id).await?;
        self.validate_draft(&draft).await?;

        let previous_image = post.image.clone();
        let mut post_active: PostActiveModel = post.into();

        post_active.text = Set(draft.text);
        post_active.group_id = Set(draft.group_id);

        let new_image = match &draft.image {
            Some(upload) => Some(self.media.save_post_image(upload).await?),
            None => None,
        };
        let replaced_image = match &new_image {
            Some(path) => {
                post_active.image = Set(Some(path.clone()));
                previous_image
            }
            None => None,
        };

        let updated = post_active.update(&self.db).await;
        let updated = self.keep_image_if_saved(updated, new_image.as_deref()).await?;

        if let Some(old) = replaced_image {
            self.media.remove(&old).await;
        }

        info!(post = %post_id, "post updated");
        Ok(updated)
    }

    /// Delete a post and its comments (only by author)
    pub async fn delete_post(
        &self,
        post_id: PostId,
        editor_id: UserId,
    ) -> Result<(), PostsServiceError> {
        let post = self.authored_post(post_id, editor_id).await?;

        let txn = self.db.begin().await?;

        Comment::delete_many()
            .filter(CommentColumn::PostId.eq(post_id))
            .exec(&txn)
            .await?;
        Post::delete_by_id(post_id).exec(&txn).await?;

        txn.commit().await?;

        if let Some(image) = post.image {
            self.media.remove(&image).await;
        }

        info!(post = %post_id, "post deleted");
        Ok(())
    }

    /// Count total posts by an author
    pub async fn count_posts_by_author(&self, author_id: UserId) -> Result<u64, PostsServiceError> {
        let count = Post::find()
            .filter(PostColumn::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DEFAULT_MAX_IMAGE_BYTES,
        test_utils::{insert_group, insert_user, setup_test_db},
        validation::ImageUpload,
    };
    use bytes::Bytes;
    use std::path::PathBuf;

    fn scratch_media() -> PathBuf {
        std::env::temp_dir().join(format!("yatube-posts-{}", uuid::Uuid::now_v7()))
    }

    async fn setup_test_service() -> (PostsService, PathBuf) {
        let db = setup_test_db().await;
        let media_root = scratch_media();
        let service = PostsService::new(db, MediaStore::new(&media_root), DEFAULT_MAX_IMAGE_BYTES);
        (service, media_root)
    }

    fn gif(size: usize) -> ImageUpload {
        ImageUpload {
            file_name: Some("small.gif".to_string()),
            content_type: Some("image/gif".to_string()),
            bytes: Bytes::from(vec![b'G'; size]),
        }
    }

    #[tokio::test]
    async fn test_create_post() {
        let (service, _) = setup_test_service().await;
        let author = insert_user(&service.db, "sarah").await;

        let post = service
            .create_post(author.id, PostDraft::new("It's driving me crazy!"))
            .await
            .expect("Failed to create post");

        assert_eq!(post.author_id, author.id);
        assert_eq!(post.text, "It's driving me crazy!");
        assert_eq!(post.group_id, None);
        assert_eq!(post.image, None);

        let fetched = service.get_post(post.id).await.unwrap();
        assert_eq!(fetched, post);
    }

    #[tokio::test]
    async fn test_create_post_in_group_with_image() {
        let (service, media_root) = setup_test_service().await;
        let author = insert_user(&service.db, "sarah").await;
        let group = insert_group(&service.db, "Cats", "cats").await;

        let post = service
            .create_post(
                author.id,
                PostDraft::new("look").with_group(group.id).with_image(gif(64)),
            )
            .await
            .unwrap();

        assert_eq!(post.group_id, Some(group.id));
        let image = post.image.expect("image reference stored");
        assert!(media_root.join(&image).exists());

        std::fs::remove_dir_all(&media_root).ok();
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_no_image_behind() {
        let (service, media_root) = setup_test_service().await;

        // no such user, so the author foreign key rejects the row
        let result = service
            .create_post(UserId::new(), PostDraft::new("orphan").with_image(gif(64)))
            .await;
        assert!(matches!(result, Err(PostsServiceError::DbError(_))));

        let stored = std::fs::read_dir(media_root.join("posts"))
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(stored, 0);

        std::fs::remove_dir_all(&media_root).ok();
    }

    #[tokio::test]
    async fn test_create_post_rejects_blank_text_and_unknown_group() {
        let (service, _) = setup_test_service().await;
        let author = insert_user(&service.db, "sarah").await;

        let result = service
            .create_post(
                author.id,
                PostDraft::new("  ").with_group(crate::ids::GroupId::new()),
            )
            .await;

        match result {
            Err(PostsServiceError::Invalid(errors)) => {
                assert_eq!(errors.get("text"), &[ValidationError::Required]);
                assert_eq!(errors.get("group"), &[ValidationError::UnknownGroup]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(service.count_posts_by_author(author.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oversized_image_rejected() {
        let (service, media_root) = setup_test_service().await;
        let author = insert_user(&service.db, "sarah").await;

        let result = service
            .create_post(
                author.id,
                PostDraft::new("big").with_image(gif(15 * 1024 * 1024)),
            )
            .await;

        match result {
            Err(PostsServiceError::Invalid(errors)) => {
                assert!(matches!(
                    errors.get("image"),
                    [ValidationError::ImageTooLarge { .. }]
                ));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(!media_root.join("posts").exists());
    }

    #[tokio::test]
    async fn test_update_post() {
        let (service, _) = setup_test_service().await;
        let author = insert_user(&service.db, "sarah").await;

        let post = service
            .create_post(author.id, PostDraft::new("It's driving me crazy!"))
            .await
            .unwrap();

        let updated = service
            .update_post(post.id, author.id, PostDraft::new("I'll be back!"))
            .await
            .unwrap();

        assert_eq!(updated.text, "I'll be back!");
        assert_eq!(updated.author_id, author.id);
        assert_eq!(updated.created_at, post.created_at);
    }

    #[tokio::test]
    async fn test_update_keeps_image_when_none_uploaded() {
        let (service, media_root) = setup_test_service().await;
        let author = insert_user(&service.db, "sarah").await;

        let post = service
            .create_post(author.id, PostDraft::new("pic").with_image(gif(16)))
            .await
            .unwrap();

        let updated = service
            .update_post(post.id, author.id, PostDraft::new("pic, edited"))
            .await
            .unwrap();
        assert_eq!(updated.image, post.image);

        let replaced = service
            .update_post(post.id, author.id, PostDraft::new("new pic").with_image(gif(8)))
            .await
            .unwrap();
        assert_ne!(replaced.image, post.image);
        let old = post.image.unwrap();
        assert!(!media_root.join(old).exists(), "replaced image is removed");

        std::fs::remove_dir_all(&media_root).ok();
    }

    #[tokio::test]
    async fn test_update_post_by_non_author_fails() {
        let (service, _) = setup_test_service().await;
        let author = insert_user(&service.db, "sarah").await;
        let other = insert_user(&service.db, "john").await;

        let post = service
            .create_post(author.id, PostDraft::new("mine"))
            .await
            .unwrap();

        let result = service
            .update_post(post.id, other.id, PostDraft::new("Hacked"))
            .await;
        assert!(matches!(result, Err(PostsServiceError::NotAuthor)));

        let unchanged = service.get_post(post.id).await.unwrap();
        assert_eq!(unchanged.text, "mine");
    }

    #[tokio::test]
    async fn test_delete_post_by_author_removes_comments() {
        let (service, _) = setup_test_service().await;
        let author = insert_user(&service.db, "sarah").await;

        let post = service
            .create_post(author.id, PostDraft::new("To Delete"))
            .await
            .unwrap();

        let comment = CommentActiveModel {
            id: Set(crate::ids::CommentId::new()),
            post_id: Set(post.id),
            author_id: Set(author.id),
            text: Set("bye".to_string()),
            created_at: Set(Utc::now()),
        };
        Comment::insert(comment).exec(&service.db).await.unwrap();

        service
            .delete_post(post.id, author.id)
            .await
            .expect("Author should be able to delete");

        assert!(matches!(
            service.get_post(post.id).await,
            Err(PostsServiceError::PostNotFound)
        ));
        let comments = Comment::find()
            .filter(CommentColumn::PostId.eq(post.id))
            .count(&service.db)
            .await
            .unwrap();
        assert_eq!(comments, 0);
    }

    #[tokio::test]
    async fn test_delete_post_by_non_author_fails() {
        let (service, _) = setup_test_service().await;
        let author = insert_user(&service.db, "sarah").await;
        let other = insert_user(&service.db, "john").await;

        let post = service
            .create_post(author.id, PostDraft::new("Post"))
            .await
            .unwrap();

        let result = service.delete_post(post.id, other.id).await;
        assert!(matches!(result, Err(PostsServiceError::NotAuthor)));
        assert!(service.get_post(post.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_count_posts_by_author() {
        let (service, _) = setup_test_service().await;
        let author = insert_user(&service.db, "sarah").await;
        let other = insert_user(&service.db, "john").await;

        for i in 0..3 {
            service
                .create_post(author.id, PostDraft::new(format!("Post {i}")))
                .await
                .unwrap();
        }
        service
            .create_post(other.id, PostDraft::new("someone else"))
            .await
            .unwrap();

        assert_eq!(service.count_posts_by_author(author.id).await.unwrap(), 3);
    }
}
