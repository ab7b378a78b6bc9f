use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use yatube_core::service::{
    comments::CommentsServiceError, feed::FeedError, follows::FollowsServiceError,
    groups::GroupsServiceError, posts::PostsServiceError, users::UsersServiceError,
};

use crate::render;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Malformed form payload")]
    MalformedForm,

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AppError {
    fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::InternalError(Box::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Html(render::not_found_page())).into_response()
            }
            AppError::MalformedForm => {
                (StatusCode::BAD_REQUEST, "Malformed form payload").into_response()
            }
            AppError::InternalError(err) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(render::server_error_page()),
                )
                    .into_response()
            }
        }
    }
}

impl From<UsersServiceError> for AppError {
    fn from(err: UsersServiceError) -> Self {
        match err {
            UsersServiceError::UserNotFound => AppError::NotFound,
            other => AppError::internal(other),
        }
    }
}

impl From<GroupsServiceError> for AppError {
    fn from(err: GroupsServiceError) -> Self {
        match err {
            GroupsServiceError::GroupNotFound => AppError::NotFound,
            other => AppError::internal(other),
        }
    }
}

impl From<PostsServiceError> for AppError {
    fn from(err: PostsServiceError) -> Self {
        match err {
            PostsServiceError::PostNotFound => AppError::NotFound,
            other => AppError::internal(other),
        }
    }
}

impl From<CommentsServiceError> for AppError {
    fn from(err: CommentsServiceError) -> Self {
        match err {
            CommentsServiceError::PostNotFound => AppError::NotFound,
            other => AppError::internal(other),
        }
    }
}

impl From<FollowsServiceError> for AppError {
    fn from(err: FollowsServiceError) -> Self {
        match err {
            FollowsServiceError::UserNotFound => AppError::NotFound,
            other => AppError::internal(other),
        }
    }
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        AppError::internal(err)
    }
}
