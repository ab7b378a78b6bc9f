use sea_orm::DatabaseConnection;
use thiserror::Error;
use tracing::info;

use crate::{entity::prelude::*, ids::GroupId};

#[derive(Debug, Error)]
pub enum GroupsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("group not found")]
    GroupNotFound,

    #[error("slug may only contain letters, digits, hyphens and underscores")]
    InvalidSlug,

    #[error("a group with this slug already exists")]
    SlugTaken,

    #[error("a group with this title already exists")]
    TitleTaken,
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Clone)]
pub struct GroupsService {
    db: DatabaseConnection,
}

impl GroupsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_group(
        &self,
        title: String,
        slug: String,
        description: String,
    ) -> Result<GroupModel, GroupsServiceError> {
        if !is_valid_slug(&slug) {
            return Err(GroupsServiceError::InvalidSlug);
        }

        let existing = Group::find()
            .filter(
                GroupColumn::Slug
                    .eq(slug.as_str())
                    .or(GroupColumn::Title.eq(title.as_str())),
            )
            .one(&self.db)
            .await?;

        if let Some(existing) = existing {
            return Err(if existing.slug == slug {
                GroupsServiceError::SlugTaken
            } else {
                GroupsServiceError::TitleTaken
            });
        }

        let group = GroupActiveModel {
            id: Set(GroupId::new()),
            title: Set(title),
            slug: Set(slug),
            description: Set(description),
        };

        let group = Group::insert(group).exec_with_returning(&self.db).await?;
        info!(slug = %group.slug, "group created");
        Ok(group)
    }

    pub async fn by_slug(&self, slug: &str) -> Result<GroupModel, GroupsServiceError> {
        Group::find()
            .filter(GroupColumn::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(GroupsServiceError::GroupNotFound)
    }

    pub async fn by_id(&self, group_id: GroupId) -> Result<GroupModel, GroupsServiceError> {
        Group::find_by_id(group_id)
            .one(&self.db)
            .await?
            .ok_or(GroupsServiceError::GroupNotFound)
    }

    /// Every group, by title. Feeds the group picker on the post form.
    pub async fn list_groups(&self) -> Result<Vec<GroupModel>, GroupsServiceError> {
        let groups = Group::find()
            .order_by_asc(GroupColumn::Title)
            .all(&self.db)
            .await?;

        Ok(groups)
    }
}
