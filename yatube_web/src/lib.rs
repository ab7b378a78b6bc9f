//! HTTP front end for Yatube: routing, sessions, page cache, captcha and
//! HTML rendering on top of `yatube_core`.

use std::{any::Any, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tokio::{net::TcpListener, signal};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

pub mod auth;
pub mod cache;
pub mod captcha;
pub mod error;
pub mod render;
pub mod routes;
pub mod state;

use error::AppError;
use routes::{comments, feed, follow, posts};
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let media = ServeDir::new(&state.core.config.media_root);
    let body_limit = DefaultBodyLimit::max(state.core.config.max_request_bytes);

    Router::new()
        .route("/", get(feed::index))
        .route("/group/{slug}/", get(feed::group_posts))
        .route("/follow/", get(feed::follow_index))
        .route("/new/", get(posts::new_post_form).post(posts::create_post))
        .route("/{username}/", get(feed::profile))
        .route("/{username}/follow", get(follow::profile_follow))
        .route("/{username}/unfollow", get(follow::profile_unfollow))
        .route("/{username}/{post_id}/", get(posts::post_view))
        .route(
            "/{username}/{post_id}/edit",
            get(posts::post_edit_form).post(posts::post_edit),
        )
        .route("/{username}/{post_id}/confirm", get(posts::post_confirm))
        .route("/{username}/{post_id}/delete", post(posts::post_delete))
        .route("/{username}/{post_id}/comment", post(comments::add_comment))
        .nest_service("/media", media)
        .fallback(|| async { AppError::NotFound })
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    AppError::InternalError("handler panicked".into()).into_response()
}

/// Serves until Ctrl+C or SIGTERM.
pub async fn serve(state: Arc<AppState>) -> std::io::Result<()> {
    let address = state.core.config.bind_address.clone();
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                error!(error = %err, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!(error = %err, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
