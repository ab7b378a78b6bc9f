use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

static DATA_DIR_NAME: &str = "yatube";
static DB_NAME: &str = "yatube.sqlite";
static MEDIA_DIR_NAME: &str = "media";
static CONFIG_FILE_NAME: &str = "config.json";

// data_dir_path
// |- yatube
//    |- yatube.sqlite
//    |- media/
//    |- config.json

/// Largest accepted post image, 5 MB.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no data directory on this platform")]
    NoDataDir,
    #[error("config file i/o failed")]
    Io(#[from] std::io::Error),
    #[error("config file is not valid json")]
    Json(#[from] serde_json::Error),
}

fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_page_cache_ttl_secs() -> u64 {
    20
}

fn default_session_ttl_secs() -> u64 {
    14 * 24 * 60 * 60
}

fn default_captcha_enabled() -> bool {
    true
}

fn default_max_image_bytes() -> u64 {
    DEFAULT_MAX_IMAGE_BYTES
}

fn default_max_request_bytes() -> usize {
    32 * 1024 * 1024
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct YatubeConfig {
    pub database_path: PathBuf,

    /// Uploaded images land here and are served under `/media`.
    pub media_root: PathBuf,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Lifetime of a cached global feed page. Zero disables the cache.
    #[serde(default = "default_page_cache_ttl_secs")]
    pub page_cache_ttl_secs: u64,

    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// When false, comment submission skips the captcha check.
    #[serde(default = "default_captcha_enabled")]
    pub captcha_enabled: bool,

    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,

    /// Request body cap. Kept well above `max_image_bytes` so oversized
    /// images reach validation and get a proper form error.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
}

impl YatubeConfig {
    /// Config with every path rooted in `data_dir` and defaults elsewhere.
    pub fn new(data_dir: PathBuf) -> Self {
        YatubeConfig {
            database_path: data_dir.join(DB_NAME),
            media_root: data_dir.join(MEDIA_DIR_NAME),
            bind_address: default_bind_address(),
            page_cache_ttl_secs: default_page_cache_ttl_secs(),
            session_ttl_secs: default_session_ttl_secs(),
            captcha_enabled: default_captcha_enabled(),
            max_image_bytes: default_max_image_bytes(),
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

/// Gets the existing config or initializes a new one under the platform
/// data directory.
pub async fn get_or_init() -> Result<YatubeConfig, ConfigError> {
    let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    load_or_init_in(&data_dir.join(DATA_DIR_NAME)).await
}

/// Same as [`get_or_init`] but rooted at an explicit directory.
pub async fn load_or_init_in(yatube_dir: &Path) -> Result<YatubeConfig, ConfigError> {
    let config_path = yatube_dir.join(CONFIG_FILE_NAME);

    fs::create_dir_all(yatube_dir).await?;

    if fs::try_exists(&config_path).await? {
        let mut file = fs::File::open(&config_path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        let config: YatubeConfig = serde_json::from_str(&contents)?;
        info!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else {
        let config = YatubeConfig::new(yatube_dir.to_path_buf());

        let json = serde_json::to_string_pretty(&config)?;
        let mut file = fs::File::create(&config_path).await?;
        file.write_all(json.as_bytes()).await?;

        info!(path = %config_path.display(), "wrote default config");
        Ok(config)
    }
}
