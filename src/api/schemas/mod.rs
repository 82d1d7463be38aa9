pub mod auth;
pub mod groups;
pub mod health;
pub mod messages;
pub mod users;

use crate::domain::image::ImageMeta;
use serde::Serialize;
use time::OffsetDateTime;

/// Describes an attached image without its bytes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub content_type: String,
    pub size: usize,
}

impl From<ImageMeta> for ImageInfo {
    fn from(meta: ImageMeta) -> Self {
        Self { content_type: meta.content_type, size: meta.size }
    }
}

pub(crate) const fn unix_seconds(at: OffsetDateTime) -> i64 {
    at.unix_timestamp()
}
