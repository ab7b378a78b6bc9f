#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use yatube_core::{
    config::YatubeConfig,
    entity::prelude::{DatabaseConnection, UserModel},
    test_utils::setup_test_db,
    YatubeCore,
};
use yatube_web::{app, auth::SESSION_COOKIE, state::AppState};

pub const BOUNDARY: &str = "yatube-test-boundary";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub data_dir: PathBuf,
    router: Router,
}

/// Fresh app over an in-memory database. The page cache and captcha are
/// off unless the caller turns them on.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(tweak: impl FnOnce(&mut YatubeConfig)) -> TestApp {
    let data_dir = std::env::temp_dir().join(format!("yatube-web-{}", uuid::Uuid::now_v7()));

    let mut config = YatubeConfig::new(data_dir.clone());
    config.page_cache_ttl_secs = 0;
    config.captcha_enabled = false;
    tweak(&mut config);

    let core = YatubeCore::with_connection(config, setup_test_db().await);
    let state = AppState::new(core);

    TestApp {
        router: app(state.clone()),
        state,
        data_dir,
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.data_dir).ok();
    }
}

impl TestApp {
    pub fn db(&self) -> &DatabaseConnection {
        &self.state.core.db
    }

    /// Cookie header value for a fresh session of `user`.
    pub async fn login(&self, user: &UserModel) -> String {
        let token = self.state.sessions.open(user.id).await;
        format!("{SESSION_COOKIE}={token}")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
        let mut request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        form: MultipartForm,
    ) -> Response<Body> {
        let mut request = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(form.finish())).unwrap())
            .await
    }
}

/// Hand-built multipart body.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    bytes.to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

pub fn assert_redirect(response: &Response<Body>, to: &str) {
    assert!(
        response.status().is_redirection(),
        "expected redirect to {to}, got {}",
        response.status()
    );
    assert_eq!(location(response), to);
}

pub fn assert_ok(response: &Response<Body>) {
    assert_eq!(response.status(), StatusCode::OK);
}

/// Smallest valid GIF.
pub const TINY_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xff, 0xff,
    0xff, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];
