use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use yatube_core::{config, YatubeCore};
use yatube_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = config::get_or_init()
        .await
        .context("failed to load configuration")?;

    info!("Initializing state...");
    let core = YatubeCore::start(config)
        .await
        .context("failed to start core")?;

    yatube_web::serve(AppState::new(core))
        .await
        .context("server error")
}
