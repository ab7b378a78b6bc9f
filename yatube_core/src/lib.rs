pub mod config;
pub mod entity;
pub mod error;
pub mod ids;
pub mod media;
pub mod models;
pub mod service;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use sea_orm::DatabaseConnection;
use tracing::info;

use crate::{
    config::YatubeConfig,
    error::CoreError,
    media::MediaStore,
    service::{
        comments::CommentsService, feed::FeedService, follows::FollowsService,
        groups::GroupsService, posts::PostsService, users::UsersService,
    },
};

/// Main runtime handle: the database connection plus every service built
/// on top of it.
#[derive(Clone)]
pub struct YatubeCore {
    pub config: YatubeConfig,
    pub db: DatabaseConnection,
    pub media: MediaStore,

    pub users: UsersService,
    pub groups: GroupsService,
    pub posts: PostsService,
    pub comments: CommentsService,
    pub follows: FollowsService,
    pub feed: FeedService,
}

impl YatubeCore {
    /// Opens (or creates) the database from `config`, applies migrations
    /// and prepares the media directory.
    pub async fn start(config: YatubeConfig) -> Result<Self, CoreError> {
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        tokio::fs::create_dir_all(&config.media_root).await?;

        let core = Self::with_connection(config, db);
        info!(media = %core.media.root().display(), "yatube core ready");
        Ok(core)
    }

    /// Wires services over an already migrated connection.
    pub fn with_connection(config: YatubeConfig, db: DatabaseConnection) -> Self {
        let media = MediaStore::new(config.media_root.clone());

        Self {
            users: UsersService::new(db.clone()),
            groups: GroupsService::new(db.clone()),
            posts: PostsService::new(db.clone(), media.clone(), config.max_image_bytes),
            comments: CommentsService::new(db.clone()),
            follows: FollowsService::new(db.clone()),
            feed: FeedService::new(db.clone()),
            config,
            db,
            media,
        }
    }
}

pub mod prelude {
    pub use super::config;
    pub use super::entity;
    pub use super::error;
    pub use super::ids;
    pub use super::models;
    pub use super::service;
    pub use super::validation;

    pub use super::YatubeCore;
}
