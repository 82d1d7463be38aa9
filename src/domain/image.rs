use crate::error::{AppError, Result};
use bytes::Bytes;

/// An uploaded image held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub content_type: String,
    pub data: Bytes,
}

impl Image {
    /// # Errors
    /// Returns `AppError::BadRequest` if the payload is empty, too large, or not an image type.
    pub fn new(content_type: Option<&str>, data: Bytes, max_bytes: usize) -> Result<Self> {
        let content_type = content_type.map(str::trim).unwrap_or_default().to_ascii_lowercase();
        if !content_type.starts_with("image/") || content_type.len() <= "image/".len() {
            return Err(AppError::bad_request("Attachment must be an image"));
        }
        if data.is_empty() {
            return Err(AppError::bad_request("Image is empty"));
        }
        if data.len() > max_bytes {
            return Err(AppError::bad_request(format!("Image exceeds the {max_bytes} byte limit")));
        }
        Ok(Self { content_type, data })
    }

    #[must_use]
    pub fn meta(&self) -> ImageMeta {
        ImageMeta { content_type: self.content_type.clone(), size: self.data.len() }
    }
}

/// What list and detail views expose about an image: never the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMeta {
    pub content_type: String,
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_image() {
        let image = Image::new(Some("Image/PNG"), Bytes::from_static(b"\x89PNG"), 10).unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.meta().size, 4);
    }

    #[test]
    fn test_rejects_non_images() {
        assert!(Image::new(Some("text/plain"), Bytes::from_static(b"hi"), 10).is_err());
        assert!(Image::new(Some("image/"), Bytes::from_static(b"hi"), 10).is_err());
        assert!(Image::new(None, Bytes::from_static(b"hi"), 10).is_err());
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert!(Image::new(Some("image/png"), Bytes::new(), 10).is_err());
        assert!(Image::new(Some("image/png"), Bytes::from(vec![0u8; 11]), 10).is_err());
    }
}
