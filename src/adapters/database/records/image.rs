use crate::domain::image::Image;
use bytes::Bytes;

#[derive(Debug, sqlx::FromRow)]
pub struct ImageRecord {
    pub(crate) image: Option<Vec<u8>>,
    pub(crate) image_content_type: Option<String>,
}

impl ImageRecord {
    pub(crate) fn into_image(self) -> Option<Image> {
        match (self.image, self.image_content_type) {
            (Some(data), Some(content_type)) => Some(Image { content_type, data: Bytes::from(data) }),
            _ => None,
        }
    }
}
