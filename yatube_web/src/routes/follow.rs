use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tracing::debug;
use yatube_core::service::follows::FollowOutcome;

use crate::{auth::LoggedIn, error::AppError, render::profile_url, state::AppState};

pub async fn profile_follow(
    State(state): State<Arc<AppState>>,
    LoggedIn(user): LoggedIn,
    Path(username): Path<String>,
) -> Result<Redirect, AppError> {
    let author = state.core.users.by_username(&username).await?;

    let outcome = state.core.follows.follow(user.id, author.id).await?;
    if outcome != FollowOutcome::Followed {
        debug!(?outcome, author = %author.id, "follow request changed nothing");
    }

    Ok(Redirect::to(&profile_url(&author.username)))
}

pub async fn profile_unfollow(
    State(state): State<Arc<AppState>>,
    LoggedIn(user): LoggedIn,
    Path(username): Path<String>,
) -> Result<Redirect, AppError> {
    let author = state.core.users.by_username(&username).await?;
    state.core.follows.unfollow(user.id, author.id).await?;

    Ok(Redirect::to(&profile_url(&author.username)))
}
