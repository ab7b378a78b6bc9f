use sea_orm::DbErr;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration unavailable")]
    Config(#[from] ConfigError),
    #[error("data store unavailable")]
    Database(#[from] DbErr),
    #[error("media directory unavailable")]
    Media(#[from] std::io::Error),
}
