use crate::domain::image::ImageMeta;
use crate::domain::message::{Message, MessageTarget};
use crate::error::AppError;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct MessageRecord {
    pub(crate) id: Uuid,
    pub(crate) sender_id: Uuid,
    pub(crate) recipient_id: Option<Uuid>,
    pub(crate) group_id: Option<Uuid>,
    pub(crate) contents: Option<String>,
    pub(crate) image_content_type: Option<String>,
    pub(crate) image_size: Option<i32>,
    pub(crate) created_at: OffsetDateTime,
}

impl TryFrom<MessageRecord> for Message {
    type Error = AppError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let target = match (record.recipient_id, record.group_id) {
            (Some(recipient), None) => MessageTarget::Direct(recipient),
            (None, Some(group)) => MessageTarget::Group(group),
            _ => {
                tracing::error!(message_id = %record.id, "Stored message has an invalid target");
                return Err(AppError::Internal);
            }
        };

        let image = record.image_content_type.map(|content_type| ImageMeta {
            content_type,
            size: record.image_size.and_then(|s| usize::try_from(s).ok()).unwrap_or(0),
        });

        Ok(Self {
            id: record.id,
            sender_id: record.sender_id,
            target,
            contents: record.contents,
            image,
            created_at: record.created_at,
        })
    }
}
