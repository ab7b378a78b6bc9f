use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::debug;
use yatube_core::{
    service::comments::CommentsServiceError,
    validation::{FieldErrors, ValidationError},
};

use super::{parse_post_id, posts::render_post};
use crate::{
    auth::{LoggedIn, Viewer},
    error::AppError,
    render::post_url,
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentSubmission {
    text: String,
    captcha_key: String,
    captcha_answer: String,
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    LoggedIn(user): LoggedIn,
    Path((username, post_id)): Path<(String, String)>,
    Form(submission): Form<CommentSubmission>,
) -> Result<Response, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let viewer = Viewer(Some(user.clone()));

    let passed = state
        .captcha
        .verify(&submission.captcha_key, &submission.captcha_answer)
        .await;
    if !passed {
        debug!(user = %user.id, post = %post_id, "comment captcha failed");
        let errors = FieldErrors::single("captcha", ValidationError::CaptchaFailed);
        return render_post(&state, &viewer, &username, post_id, &submission.text, &errors).await;
    }

    match state
        .core
        .comments
        .create_comment(post_id, user.id, submission.text.clone())
        .await
    {
        Ok(_) => Ok(Redirect::to(&post_url(&username, post_id)).into_response()),
        Err(CommentsServiceError::Invalid(errors)) => {
            render_post(&state, &viewer, &username, post_id, &submission.text, &errors).await
        }
        Err(err) => Err(err.into()),
    }
}
