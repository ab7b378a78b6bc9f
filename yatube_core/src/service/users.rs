use chrono::Utc;
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tracing::info;

use crate::{entity::prelude::*, ids::UserId};

#[derive(Debug, Error)]
pub enum UsersServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("user not found")]
    UserNotFound,

    #[error("username already taken")]
    UsernameTaken,
}

/// Read side of the user directory plus account creation. Password
/// hashing and login belong to the authentication collaborator; this
/// service only stores the hash it is given.
#[derive(Clone)]
pub struct UsersService {
    db: DatabaseConnection,
}

impl UsersService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_user(
        &self,
        username: String,
        email: String,
        password_hash: String,
    ) -> Result<UserModel, UsersServiceError> {
        let taken = User::find()
            .filter(UserColumn::Username.eq(username.as_str()))
            .one(&self.db)
            .await?
            .is_some();

        if taken {
            return Err(UsersServiceError::UsernameTaken);
        }

        let user = UserActiveModel {
            id: Set(UserId::new()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            date_joined: Set(Utc::now()),
        };

        let user = User::insert(user).exec_with_returning(&self.db).await?;
        info!(user = %user.username, "user created");
        Ok(user)
    }

    pub async fn by_username(&self, username: &str) -> Result<UserModel, UsersServiceError> {
        User::find()
            .filter(UserColumn::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(UsersServiceError::UserNotFound)
    }

    pub async fn by_id(&self, user_id: UserId) -> Result<UserModel, UsersServiceError> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(UsersServiceError::UserNotFound)
    }
}
