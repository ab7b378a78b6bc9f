use std::{sync::Arc, time::Duration};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Uri},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use moka::future::Cache;
use rand::distr::{Alphanumeric, SampleString};
use tracing::{debug, info};
use yatube_core::{
    entity::prelude::UserModel, ids::UserId, service::users::UsersServiceError,
};

use crate::{error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "sessionid";
pub const LOGIN_PATH: &str = "/auth/login/";

const TOKEN_LEN: usize = 40;

/// In-process session table: opaque cookie token to user id. Sessions
/// expire after sitting idle for the configured period.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, UserId>,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Cache::builder().time_to_idle(idle_timeout).build(),
        }
    }

    pub async fn open(&self, user_id: UserId) -> String {
        let token = Alphanumeric.sample_string(&mut rand::rng(), TOKEN_LEN);
        self.sessions.insert(token.clone(), user_id).await;

        info!(user = %user_id, "session opened");
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<UserId> {
        self.sessions.get(token).await
    }

    pub async fn close(&self, token: &str) {
        self.sessions.invalidate(token).await;
    }
}

/// Redirect to the login page that brings the visitor back to `uri`.
pub fn login_redirect(uri: &Uri) -> Redirect {
    let next = urlencoding::encode(uri.path());
    Redirect::to(&format!("{LOGIN_PATH}?next={next}"))
}

/// The user behind the session cookie, if any.
pub struct Viewer(pub Option<UserModel>);

impl Viewer {
    pub fn user(&self) -> Option<&UserModel> {
        self.0.as_ref()
    }

    pub fn is(&self, user_id: UserId) -> bool {
        self.0.as_ref().is_some_and(|user| user.id == user_id)
    }
}

impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Viewer(None));
        };

        let Some(user_id) = state.sessions.resolve(cookie.value()).await else {
            debug!("stale session cookie");
            return Ok(Viewer(None));
        };

        match state.core.users.by_id(user_id).await {
            Ok(user) => Ok(Viewer(Some(user))),
            Err(UsersServiceError::UserNotFound) => Ok(Viewer(None)),
            Err(err) => Err(err.into()),
        }
    }
}

/// Like [`Viewer`] but anonymous visitors are sent to the login page.
pub struct LoggedIn(pub UserModel);

impl FromRequestParts<Arc<AppState>> for LoggedIn {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let viewer = Viewer::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match viewer.0 {
            Some(user) => Ok(LoggedIn(user)),
            None => Err(login_redirect(&parts.uri).into_response()),
        }
    }
}
