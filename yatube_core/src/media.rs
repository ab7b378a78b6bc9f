use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::validation::{ImageUpload, ValidationError};

static POST_IMAGES_DIR: &str = "posts";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media storage i/o failed")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Rejected(#[from] ValidationError),
}

/// Filesystem storage for uploaded images. Stored references are paths
/// relative to `root`, which is also what gets served under `/media`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save_post_image(&self, image: &ImageUpload) -> Result<String, MediaError> {
        let extension = image.extension().ok_or(ValidationError::NotAnImage)?;
        let relative = format!("{POST_IMAGES_DIR}/{}.{extension}", Uuid::now_v7());

        fs::create_dir_all(self.root.join(POST_IMAGES_DIR)).await?;
        fs::write(self.root.join(&relative), &image.bytes).await?;

        debug!(path = %relative, size = image.size(), "stored post image");
        Ok(relative)
    }

    /// Best effort: a missing file is not an error.
    pub async fn remove(&self, relative: &str) {
        if let Err(error) = fs::remove_file(self.root.join(relative)).await {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %relative, %error, "failed to remove media file");
            }
        }
    }
}
