use crate::adapters::database::records::{ImageRecord, MessageRecord};
use crate::adapters::database::{DbPool, FOREIGN_KEY_VIOLATION, is_violation};
use crate::adapters::repository::MessageRepository;
use crate::domain::image::Image;
use crate::domain::message::{Message, MessageTarget, NewMessage};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PgMessageRepository {
    pool: DbPool,
}

impl PgMessageRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_messages(records: Vec<MessageRecord>) -> Result<Vec<Message>> {
    records.into_iter().map(Message::try_from).collect()
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    /// Records a new message.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the recipient or group does not exist.
    #[tracing::instrument(level = "debug", skip(self, message), fields(sender_id = %message.sender_id))]
    async fn create(&self, message: NewMessage) -> Result<Message> {
        let target = message.target;
        let (image, content_type) = match message.image {
            Some(image) => (Some(image.data.to_vec()), Some(image.content_type)),
            None => (None, None),
        };

        let result = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (id, sender_id, recipient_id, group_id, contents, image, image_content_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, sender_id, recipient_id, group_id, contents, image_content_type,
                      octet_length(image) AS image_size, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(message.sender_id)
        .bind(target.recipient_id())
        .bind(target.group_id())
        .bind(message.contents)
        .bind(image)
        .bind(content_type)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(record) => record.try_into(),
            // the target vanished between validation and insert
            Err(e) if is_violation(&e, FOREIGN_KEY_VIOLATION) => Err(match target {
                MessageTarget::Direct(_) => AppError::not_found("Recipient not found"),
                MessageTarget::Group(_) => AppError::not_found("Group not found"),
            }),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender_id, recipient_id, group_id, contents, image_content_type,
                   octet_length(image) AS image_size, created_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        record.map(Message::try_from).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_image(&self, id: Uuid) -> Result<Option<Image>> {
        let record =
            sqlx::query_as::<_, ImageRecord>("SELECT image, image_content_type FROM messages WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(record.and_then(ImageRecord::into_image))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_between(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender_id, recipient_id, group_id, contents, image_content_type,
                   octet_length(image) AS image_size, created_at
            FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;

        into_messages(records)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_for_group(&self, group_id: Uuid) -> Result<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender_id, recipient_id, group_id, contents, image_content_type,
                   octet_length(image) AS image_size, created_at
            FROM messages
            WHERE group_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        into_messages(records)
    }

    #[tracing::instrument(level = "debug", skip(self, group_ids))]
    async fn list_involving(&self, user_id: Uuid, group_ids: &[Uuid]) -> Result<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender_id, recipient_id, group_id, contents, image_content_type,
                   octet_length(image) AS image_size, created_at
            FROM messages
            WHERE (group_id IS NULL AND (sender_id = $1 OR recipient_id = $1))
               OR group_id = ANY($2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(group_ids)
        .fetch_all(&self.pool)
        .await?;

        into_messages(records)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_direct_for_user(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender_id, recipient_id, group_id, contents, image_content_type,
                   octet_length(image) AS image_size, created_at
            FROM messages
            WHERE group_id IS NULL AND (sender_id = $1 OR recipient_id = $1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_messages(records)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete_for_group(&self, group_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM messages WHERE group_id = $1").bind(group_id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
