//! Fixtures shared by the service tests here and the HTTP tests in
//! `yatube_web`. Enabled for downstream crates through the `test-utils`
//! feature.

use chrono::{DateTime, Utc};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::{
    entity::prelude::*,
    ids::{GroupId, PostId, UserId},
    models::migrator::Migrator,
};

/// Fresh in-memory SQLite database with every migration applied.
/// Each call yields an isolated database.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub async fn insert_user(db: &DatabaseConnection, username: &str) -> UserModel {
    let user = UserActiveModel {
        id: Set(UserId::new()),
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        password_hash: Set("not-a-real-hash".to_string()),
        date_joined: Set(Utc::now()),
    };
    User::insert(user)
        .exec_with_returning(db)
        .await
        .expect("Failed to insert user")
}

pub async fn insert_group(db: &DatabaseConnection, title: &str, slug: &str) -> GroupModel {
    let group = GroupActiveModel {
        id: Set(GroupId::new()),
        title: Set(title.to_string()),
        slug: Set(slug.to_string()),
        description: Set(format!("All about {title}")),
    };
    Group::insert(group)
        .exec_with_returning(db)
        .await
        .expect("Failed to insert group")
}

/// Inserts a post with an explicit timestamp, bypassing the service so
/// ordering tests do not depend on the wall clock.
pub async fn insert_post_at(
    db: &DatabaseConnection,
    author_id: UserId,
    text: &str,
    group_id: Option<GroupId>,
    created_at: DateTime<Utc>,
) -> PostModel {
    let post = PostActiveModel {
        id: Set(PostId::new()),
        text: Set(text.to_string()),
        created_at: Set(created_at),
        author_id: Set(author_id),
        group_id: Set(group_id),
        image: Set(None),
    };
    Post::insert(post)
        .exec_with_returning(db)
        .await
        .expect("Failed to insert post")
}

/// Timestamp `minutes` after a fixed origin.
pub fn minutes(minutes: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("valid origin")
        + chrono::Duration::minutes(minutes)
}
