use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    entity::prelude::*,
    ids::{CommentId, PostId, UserId},
    validation::{validate_comment_text, FieldErrors},
};

#[derive(Debug, Error)]
pub enum CommentsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("post not found")]
    PostNotFound,

    #[error("invalid comment form: {0}")]
    Invalid(FieldErrors),
}

/// A comment joined with its author's username for display.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub comment: CommentModel,
    pub author_username: String,
}

#[derive(Clone)]
pub struct CommentsService {
    db: DatabaseConnection,
}

impl CommentsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        text: String,
    ) -> Result<CommentModel, CommentsServiceError> {
        validate_comment_text(&text).map_err(CommentsServiceError::Invalid)?;

        let post_exists = Post::find_by_id(post_id).one(&self.db).await?.is_some();
        if !post_exists {
            return Err(CommentsServiceError::PostNotFound);
        }

        let comment = CommentActiveModel {
            id: Set(CommentId::new()),
            post_id: Set(post_id),
            author_id: Set(author_id),
            text: Set(text),
            created_at: Set(Utc::now()),
        };

        let comment = Comment::insert(comment).exec_with_returning(&self.db).await?;
        info!(post = %post_id, comment = %comment.id, "comment added");
        Ok(comment)
    }

    /// Comments on a post, oldest first.
    pub async fn list_for_post(
        &self,
        post_id: PostId,
    ) -> Result<Vec<CommentView>, CommentsServiceError> {
        let rows = Comment::find()
            .filter(CommentColumn::PostId.eq(post_id))
            .find_also_related(User)
            .order_by_asc(CommentColumn::CreatedAt)
            .order_by_asc(CommentColumn::Id)
            .all(&self.db)
            .await?;

        let comments = rows
            .into_iter()
            .filter_map(|(comment, author)| match author {
                Some(author) => Some(CommentView {
                    comment,
                    author_username: author.username,
                }),
                None => {
                    warn!(comment = %comment.id, "comment without author skipped");
                    None
                }
            })
            .collect();

        Ok(comments)
    }

    pub async fn count_for_post(&self, post_id: PostId) -> Result<u64, CommentsServiceError> {
        let count = Comment::find()
            .filter(CommentColumn::PostId.eq(post_id))
            .count(&self.db)
            .await?;

        Ok(count)
    }
}
