use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};
use yatube_core::{
    entity::prelude::UserModel,
    ids::{GroupId, PostId},
    service::{groups::GroupsServiceError, posts::PostsServiceError},
    validation::{FieldErrors, ImageUpload, PostDraft, ValidationError},
};

use super::parse_post_id;
use crate::{
    auth::{LoggedIn, Viewer},
    error::AppError,
    render::{self, post_url, profile_url, CommentForm, PostForm, PostView},
    state::AppState,
};

/// Raw fields of the multipart post form.
#[derive(Debug, Default)]
struct PostSubmission {
    text: String,
    group: String,
    image: Option<ImageUpload>,
}

impl PostSubmission {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut submission = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            match field.name() {
                Some("text") => submission.text = field.text().await.map_err(malformed)?,
                Some("group") => submission.group = field.text().await.map_err(malformed)?,
                Some("image") => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(malformed)?;

                    // browsers send an empty part when no file was picked
                    if !bytes.is_empty() {
                        submission.image = Some(ImageUpload {
                            file_name,
                            content_type,
                            bytes,
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(submission)
    }

    /// Builds the draft. An unparsable group id is reported like an
    /// unknown group, together with the other field errors.
    fn into_draft(self, max_image_bytes: u64) -> Result<PostDraft, FieldErrors> {
        let group = self.group.trim();
        let group_id = if group.is_empty() {
            Ok(None)
        } else {
            group.parse::<GroupId>().map(Some)
        };

        let mut draft = PostDraft::new(self.text);
        draft.image = self.image;

        match group_id {
            Ok(group_id) => {
                draft.group_id = group_id;
                Ok(draft)
            }
            Err(_) => {
                let mut errors = draft.validate(max_image_bytes);
                errors.add("group", ValidationError::UnknownGroup);
                Err(errors)
            }
        }
    }
}

fn malformed(err: axum::extract::multipart::MultipartError) -> AppError {
    warn!(error = %err, "unreadable multipart body");
    AppError::MalformedForm
}

/// Collects everything the post form needs to be shown again.
async fn form_page(
    state: &AppState,
    viewer: &UserModel,
    heading: &str,
    action: &str,
    text: &str,
    group_id: Option<GroupId>,
    errors: &FieldErrors,
) -> Result<Response, AppError> {
    let groups = state.core.groups.list_groups().await?;
    let form = PostForm {
        heading,
        action,
        text,
        group_id,
        groups: &groups,
        errors,
    };

    Ok(Html(render::post_form_page(Some(viewer), &form)).into_response())
}

const NEW_POST_HEADING: &str = "Добавить запись";
const EDIT_POST_HEADING: &str = "Редактировать запись";

pub async fn new_post_form(
    State(state): State<Arc<AppState>>,
    LoggedIn(user): LoggedIn,
) -> Result<Response, AppError> {
    form_page(&state, &user, NEW_POST_HEADING, "/new/", "", None, &FieldErrors::new()).await
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    LoggedIn(user): LoggedIn,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = PostSubmission::read(multipart).await?;
    let text = submission.text.clone();

    let result = match submission.into_draft(state.core.config.max_image_bytes) {
        Ok(draft) => {
            let group_id = draft.group_id;
            state
                .core
                .posts
                .create_post(user.id, draft)
                .await
                .map_err(|err| (err, group_id))
        }
        Err(errors) => Err((PostsServiceError::Invalid(errors), None)),
    };

    match result {
        Ok(post) => {
            debug!(post = %post.id, "post published");
            Ok(Redirect::to("/").into_response())
        }
        Err((PostsServiceError::Invalid(errors), group_id)) => {
            form_page(&state, &user, NEW_POST_HEADING, "/new/", &text, group_id, &errors).await
        }
        Err((err, _)) => Err(err.into()),
    }
}

pub async fn post_view(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let post_id = parse_post_id(&post_id)?;
    render_post(&state, &viewer, &username, post_id, "", &FieldErrors::new()).await
}

/// Renders the post page, optionally with a comment form that failed
/// validation. A post looked up under someone else's name sends the
/// visitor to that user's profile.
pub(crate) async fn render_post(
    state: &AppState,
    viewer: &Viewer,
    username: &str,
    post_id: PostId,
    comment_text: &str,
    comment_errors: &FieldErrors,
) -> Result<Response, AppError> {
    let core = &state.core;
    let author = core.users.by_username(username).await?;
    let post = core.posts.get_post(post_id).await?;

    if post.author_id != author.id {
        return Ok(Redirect::to(&profile_url(&author.username)).into_response());
    }

    let group = match post.group_id {
        Some(group_id) => match core.groups.by_id(group_id).await {
            Ok(group) => Some(group),
            Err(GroupsServiceError::GroupNotFound) => None,
            Err(err) => return Err(err.into()),
        },
        None => None,
    };

    let comments = core.comments.list_for_post(post.id).await?;
    let posts_count = core.posts.count_posts_by_author(author.id).await?;

    let challenge = match viewer.user() {
        Some(_) => state.captcha.issue().await,
        None => None,
    };

    let view = PostView {
        post: &post,
        author: &author,
        group: group.as_ref(),
        posts_count,
        comments: &comments,
    };
    let form = CommentForm {
        text: comment_text,
        errors: comment_errors,
        challenge: challenge.as_ref(),
    };

    Ok(Html(render::post_page(viewer.user(), &view, &form)).into_response())
}

pub async fn post_edit_form(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.core.posts.get_post(post_id).await?;

    let Some(user) = viewer.0.filter(|user| user.id == post.author_id) else {
        return Ok(Redirect::to(&post_url(&username, post_id)).into_response());
    };

    let action = format!("{}edit", post_url(&username, post_id));
    form_page(
        &state,
        &user,
        EDIT_POST_HEADING,
        &action,
        &post.text,
        post.group_id,
        &FieldErrors::new(),
    )
    .await
}

pub async fn post_edit(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path((username, post_id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let post_page = post_url(&username, post_id);

    let Some(user) = viewer.0 else {
        state.core.posts.get_post(post_id).await?;
        return Ok(Redirect::to(&post_page).into_response());
    };

    // strangers get the redirect before the body is read
    match state.core.posts.authored_post(post_id, user.id).await {
        Ok(_) => {}
        Err(PostsServiceError::NotAuthor) => return Ok(Redirect::to(&post_page).into_response()),
        Err(err) => return Err(err.into()),
    }

    let submission = PostSubmission::read(multipart).await?;
    let text = submission.text.clone();
    let action = format!("{post_page}edit");

    let result = match submission.into_draft(state.core.config.max_image_bytes) {
        Ok(draft) => {
            let group_id = draft.group_id;
            state
                .core
                .posts
                .update_post(post_id, user.id, draft)
                .await
                .map_err(|err| (err, group_id))
        }
        Err(errors) => Err((PostsServiceError::Invalid(errors), None)),
    };

    match result {
        Ok(_) => Ok(Redirect::to(&post_page).into_response()),
        Err((PostsServiceError::NotAuthor, _)) => Ok(Redirect::to(&post_page).into_response()),
        Err((PostsServiceError::Invalid(errors), group_id)) => {
            form_page(&state, &user, EDIT_POST_HEADING, &action, &text, group_id, &errors).await
        }
        Err((err, _)) => Err(err.into()),
    }
}

pub async fn post_confirm(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.core.posts.get_post(post_id).await?;

    if !viewer.is(post.author_id) {
        return Ok(Redirect::to(&post_url(&username, post_id)).into_response());
    }

    Ok(Html(render::confirm_page(viewer.user(), &username, post_id)).into_response())
}

pub async fn post_delete(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.core.posts.get_post(post_id).await?;

    let Some(user) = viewer.0.filter(|user| user.id == post.author_id) else {
        return Ok(Redirect::to(&post_url(&username, post_id)).into_response());
    };

    match state.core.posts.delete_post(post_id, user.id).await {
        Ok(()) => Ok(Redirect::to(&profile_url(&username)).into_response()),
        Err(PostsServiceError::NotAuthor) => {
            Ok(Redirect::to(&post_url(&username, post_id)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}
