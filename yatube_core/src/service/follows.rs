use chrono::Utc;
use sea_orm::{sea_query::OnConflict, DatabaseConnection};
use thiserror::Error;
use tracing::{debug, info};

use crate::{entity::prelude::*, ids::UserId};

#[derive(Debug, Error)]
pub enum FollowsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("user not found")]
    UserNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    /// Following yourself is silently refused.
    SelfFollow,
}

#[derive(Clone)]
pub struct FollowsService {
    db: DatabaseConnection,
}

impl FollowsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Idempotent: an existing edge is reported, not treated as an error.
    pub async fn follow(
        &self,
        user_id: UserId,
        author_id: UserId,
    ) -> Result<FollowOutcome, FollowsServiceError> {
        if user_id == author_id {
            debug!(user = %user_id, "ignored self-follow");
            return Ok(FollowOutcome::SelfFollow);
        }

        let author_exists = User::find_by_id(author_id).one(&self.db).await?.is_some();
        if !author_exists {
            return Err(FollowsServiceError::UserNotFound);
        }

        let edge = FollowActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            created_at: Set(Utc::now()),
        };
        // the primary key decides between concurrent requests
        let inserted = Follow::insert(edge)
            .on_conflict(
                OnConflict::columns([FollowColumn::UserId, FollowColumn::AuthorId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        if inserted == 0 {
            debug!(user = %user_id, author = %author_id, "follow already exists");
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        info!(user = %user_id, author = %author_id, "follow created");
        Ok(FollowOutcome::Followed)
    }

    /// Returns whether an edge was removed.
    pub async fn unfollow(
        &self,
        user_id: UserId,
        author_id: UserId,
    ) -> Result<bool, FollowsServiceError> {
        let result = Follow::delete_by_id((user_id, author_id))
            .exec(&self.db)
            .await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!(user = %user_id, author = %author_id, "follow removed");
        }
        Ok(removed)
    }

    pub async fn is_following(
        &self,
        user_id: UserId,
        author_id: UserId,
    ) -> Result<bool, FollowsServiceError> {
        let edge = Follow::find_by_id((user_id, author_id))
            .one(&self.db)
            .await?;

        Ok(edge.is_some())
    }

    /// How many users follow `author_id`
    pub async fn followers_count(&self, author_id: UserId) -> Result<u64, FollowsServiceError> {
        let count = Follow::find()
            .filter(FollowColumn::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;

        Ok(count)
    }

    /// How many authors `user_id` follows
    pub async fn following_count(&self, user_id: UserId) -> Result<u64, FollowsServiceError> {
        let count = Follow::find()
            .filter(FollowColumn::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_user, setup_test_db};

    async fn setup_test_service() -> FollowsService {
        FollowsService::new(setup_test_db().await)
    }

    #[tokio::test]
    async fn test_follow_and_unfollow() {
        let service = setup_test_service().await;
        let reader = insert_user(&service.db, "john").await;
        let author = insert_user(&service.db, "sarah").await;

        let outcome = service.follow(reader.id, author.id).await.unwrap();
        assert_eq!(outcome, FollowOutcome::Followed);
        assert!(service.is_following(reader.id, author.id).await.unwrap());
        assert!(!service.is_following(author.id, reader.id).await.unwrap());

        assert!(service.unfollow(reader.id, author.id).await.unwrap());
        assert!(!service.is_following(reader.id, author.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_follow_twice_is_a_noop() {
        let service = setup_test_service().await;
        let reader = insert_user(&service.db, "john").await;
        let author = insert_user(&service.db, "sarah").await;

        service.follow(reader.id, author.id).await.unwrap();
        let again = service.follow(reader.id, author.id).await.unwrap();

        assert_eq!(again, FollowOutcome::AlreadyFollowing);
        assert_eq!(service.followers_count(author.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_follows_create_one_edge() {
        let service = setup_test_service().await;
        let reader = insert_user(&service.db, "john").await;
        let author = insert_user(&service.db, "sarah").await;

        let (first, second) = tokio::join!(
            service.follow(reader.id, author.id),
            service.follow(reader.id, author.id)
        );

        let mut outcomes = vec![first.unwrap(), second.unwrap()];
        outcomes.sort_by_key(|outcome| *outcome == FollowOutcome::AlreadyFollowing);
        assert_eq!(
            outcomes,
            vec![FollowOutcome::Followed, FollowOutcome::AlreadyFollowing]
        );
        assert_eq!(service.followers_count(author.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_self_follow_creates_no_edge() {
        let service = setup_test_service().await;
        let user = insert_user(&service.db, "sarah").await;

        let outcome = service.follow(user.id, user.id).await.unwrap();

        assert_eq!(outcome, FollowOutcome::SelfFollow);
        assert!(!service.is_following(user.id, user.id).await.unwrap());
        assert_eq!(service.followers_count(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_follow_unknown_author() {
        let service = setup_test_service().await;
        let reader = insert_user(&service.db, "john").await;

        let result = service.follow(reader.id, UserId::new()).await;
        assert!(matches!(result, Err(FollowsServiceError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_unfollow_without_edge_is_a_noop() {
        let service = setup_test_service().await;
        let reader = insert_user(&service.db, "john").await;
        let author = insert_user(&service.db, "sarah").await;

        assert!(!service.unfollow(reader.id, author.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_counts() {
        let service = setup_test_service().await;
        let sarah = insert_user(&service.db, "sarah").await;
        let john = insert_user(&service.db, "john").await;
        let kyle = insert_user(&service.db, "kyle").await;

        service.follow(john.id, sarah.id).await.unwrap();
        service.follow(kyle.id, sarah.id).await.unwrap();
        service.follow(john.id, kyle.id).await.unwrap();

        assert_eq!(service.followers_count(sarah.id).await.unwrap(), 2);
        assert_eq!(service.following_count(sarah.id).await.unwrap(), 0);
        assert_eq!(service.following_count(john.id).await.unwrap(), 2);
        assert_eq!(service.followers_count(kyle.id).await.unwrap(), 1);
    }
}
