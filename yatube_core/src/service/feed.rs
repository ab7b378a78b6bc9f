//! Feed construction: scope filter, ordering, pagination and per-post
//! annotations (author, group, comment count).

use std::collections::HashMap;

use sea_orm::{sea_query::Expr, DatabaseConnection, Select};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    entity::prelude::*,
    ids::{GroupId, PostId, UserId},
};

/// Posts per page on the global, group and follow feeds.
pub const FEED_PAGE_SIZE: u64 = 10;
/// Posts per page on a profile.
pub const PROFILE_PAGE_SIZE: u64 = 5;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    All,
    Group(GroupId),
    Author(UserId),
    /// Posts by every author the given user follows.
    Following(UserId),
}

impl FeedScope {
    pub fn page_size(&self) -> u64 {
        match self {
            FeedScope::Author(_) => PROFILE_PAGE_SIZE,
            FeedScope::All | FeedScope::Group(_) | FeedScope::Following(_) => FEED_PAGE_SIZE,
        }
    }

    fn select(&self) -> Select<Post> {
        let query = Post::find();
        match *self {
            FeedScope::All => query,
            FeedScope::Group(group_id) => query.filter(PostColumn::GroupId.eq(group_id)),
            FeedScope::Author(author_id) => query.filter(PostColumn::AuthorId.eq(author_id)),
            FeedScope::Following(user_id) => query.filter(
                PostColumn::AuthorId.in_subquery(
                    Follow::find()
                        .select_only()
                        .column(FollowColumn::AuthorId)
                        .filter(FollowColumn::UserId.eq(user_id))
                        .into_query(),
                ),
            ),
        }
    }
}

/// Parses the raw `page` query value. Anything that is not an integer
/// means the first page; range clamping happens once the total is known.
pub fn requested_page(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(1)
}

fn clamp_page(requested: i64, total_pages: u64) -> u64 {
    if requested < 1 {
        1
    } else {
        (requested as u64).min(total_pages.max(1))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub post: PostModel,
    pub author: UserModel,
    pub group: Option<GroupModel>,
    pub comment_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    /// 1-based, always within `1..=total_pages`.
    pub number: u64,
    /// Never zero: an empty feed still has one (empty) page.
    pub total_pages: u64,
    pub total_items: u64,
    pub page_size: u64,
}

impl FeedPage {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone)]
pub struct FeedService {
    db: DatabaseConnection,
}

impl FeedService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Newest posts first; posts sharing a timestamp keep insertion order.
    pub async fn page(&self, scope: FeedScope, requested: i64) -> Result<FeedPage, FeedError> {
        let page_size = scope.page_size();

        let paginator = scope
            .select()
            .order_by_desc(PostColumn::CreatedAt)
            .order_by_asc(PostColumn::Id)
            .paginate(&self.db, page_size);

        let ItemsAndPagesNumber {
            number_of_items,
            number_of_pages,
        } = paginator.num_items_and_pages().await?;

        let total_pages = number_of_pages.max(1);
        let number = clamp_page(requested, total_pages);
        if number as i64 != requested {
            debug!(requested, number, total_pages, "clamped feed page");
        }

        let posts = if number_of_items == 0 {
            Vec::new()
        } else {
            paginator.fetch_page(number - 1).await?
        };

        let items = self.annotate(posts).await?;

        Ok(FeedPage {
            items,
            number,
            total_pages,
            total_items: number_of_items,
            page_size,
        })
    }

    /// Attaches author, group and comment count with one query each.
    async fn annotate(&self, posts: Vec<PostModel>) -> Result<Vec<FeedItem>, FeedError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
        let author_ids: Vec<UserId> = posts.iter().map(|p| p.author_id).collect();
        let group_ids: Vec<GroupId> = posts.iter().filter_map(|p| p.group_id).collect();

        let authors: HashMap<UserId, UserModel> = User::find()
            .filter(UserColumn::Id.is_in(author_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        let groups: HashMap<GroupId, GroupModel> = if group_ids.is_empty() {
            HashMap::new()
        } else {
            Group::find()
                .filter(GroupColumn::Id.is_in(group_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|group| (group.id, group))
                .collect()
        };

        let comment_counts: HashMap<PostId, i64> = Comment::find()
            .select_only()
            .column(CommentColumn::PostId)
            .column_as(Expr::col(CommentColumn::Id).count(), "comment_count")
            .filter(CommentColumn::PostId.is_in(post_ids))
            .group_by(CommentColumn::PostId)
            .into_tuple::<(PostId, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        let items = posts
            .into_iter()
            .filter_map(|post| {
                let Some(author) = authors.get(&post.author_id).cloned() else {
                    warn!(post = %post.id, "post without author skipped");
                    return None;
                };
                let group = post.group_id.and_then(|id| groups.get(&id).cloned());
                let comment_count = comment_counts.get(&post.id).copied().unwrap_or(0) as u64;

                Some(FeedItem {
                    post,
                    author,
                    group,
                    comment_count,
                })
            })
            .collect();

        Ok(items)
    }
}
