use yatube_core::ids::PostId;

use crate::error::AppError;

pub mod comments;
pub mod feed;
pub mod follow;
pub mod posts;

/// Post ids in URLs are UUIDs; anything else cannot name a post.
fn parse_post_id(raw: &str) -> Result<PostId, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}
