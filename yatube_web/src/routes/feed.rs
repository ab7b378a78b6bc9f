use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use serde::Deserialize;
use yatube_core::service::feed::{requested_page, FeedScope};

use crate::{
    auth::{LoggedIn, Viewer},
    error::AppError,
    render::{self, ProfileView},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn requested(&self) -> i64 {
        requested_page(self.page.as_deref())
    }
}

/// Global feed. Only the post list is cached; the layout is rendered per
/// viewer.
pub async fn index(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let requested = query.requested();

    let fragment = match state.page_cache.get(requested).await {
        Some(fragment) => fragment,
        None => {
            let page = state.core.feed.page(FeedScope::All, requested).await?;
            let fragment = render::feed_fragment(&page);
            state.page_cache.insert(requested, fragment.clone()).await;
            fragment
        }
    };

    Ok(Html(render::index_page(viewer.user(), &fragment)))
}

pub async fn group_posts(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let group = state.core.groups.by_slug(&slug).await?;
    let page = state
        .core
        .feed
        .page(FeedScope::Group(group.id), query.requested())
        .await?;

    Ok(Html(render::group_page(
        viewer.user(),
        &group,
        &render::feed_fragment(&page),
    )))
}

pub async fn follow_index(
    State(state): State<Arc<AppState>>,
    LoggedIn(user): LoggedIn,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let page = state
        .core
        .feed
        .page(FeedScope::Following(user.id), query.requested())
        .await?;

    Ok(Html(render::follow_page(
        Some(&user),
        &render::feed_fragment(&page),
    )))
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let core = &state.core;
    let author = core.users.by_username(&username).await?;

    let viewer_follows = match viewer.user() {
        Some(user) if user.id != author.id => {
            Some(core.follows.is_following(user.id, author.id).await?)
        }
        _ => None,
    };

    let page = core
        .feed
        .page(FeedScope::Author(author.id), query.requested())
        .await?;

    let view = ProfileView {
        author: &author,
        posts_count: page.total_items,
        followers: core.follows.followers_count(author.id).await?,
        following: core.follows.following_count(author.id).await?,
        viewer_follows,
        page: &page,
    };

    Ok(Html(render::profile_page(viewer.user(), &view)))
}
