use crate::domain::group::Group;
use crate::domain::image::ImageMeta;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct GroupRecord {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) admin_id: Uuid,
    pub(crate) image_content_type: Option<String>,
    pub(crate) image_size: Option<i32>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl GroupRecord {
    /// Members live in their own table, so they are attached after loading.
    pub(crate) fn into_group(self, member_ids: Vec<Uuid>) -> Group {
        let image = self.image_content_type.map(|content_type| ImageMeta {
            content_type,
            size: self.image_size.and_then(|s| usize::try_from(s).ok()).unwrap_or(0),
        });

        Group {
            id: self.id,
            name: self.name,
            description: self.description,
            admin_id: self.admin_id,
            member_ids,
            image,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
