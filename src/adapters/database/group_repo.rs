use crate::adapters::database::records::{GroupRecord, ImageRecord};
use crate::adapters::database::{DbPool, FOREIGN_KEY_VIOLATION, is_violation};
use crate::adapters::repository::GroupRepository;
use crate::domain::group::{Group, GroupChanges, NewGroup};
use crate::domain::image::Image;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::PgConnection;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PgGroupRepository {
    pool: DbPool,
}

impl PgGroupRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert_members(conn: &mut PgConnection, group_id: Uuid, member_ids: &[Uuid]) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id)
            SELECT $1, m.user_id
            FROM UNNEST($2::uuid[]) WITH ORDINALITY AS m(user_id, ord)
            ORDER BY m.ord
            ON CONFLICT (group_id, user_id) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(member_ids)
        .execute(conn)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_violation(&e, FOREIGN_KEY_VIOLATION) => Err(AppError::bad_request("Unknown member id")),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn members_of(&self, group_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Uuid>>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT group_id, user_id FROM group_members WHERE group_id = ANY($1) ORDER BY seq",
        )
        .bind(group_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut members: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (group_id, user_id) in rows {
            members.entry(group_id).or_default().push(user_id);
        }
        Ok(members)
    }

    async fn attach_members(&self, record: Option<GroupRecord>) -> Result<Option<Group>> {
        let Some(record) = record else {
            return Ok(None);
        };
        let mut members = self.members_of(&[record.id]).await?;
        let member_ids = members.remove(&record.id).unwrap_or_default();
        Ok(Some(record.into_group(member_ids)))
    }

    async fn touch(&self, group_id: Uuid) -> Result<Option<GroupRecord>> {
        let record = sqlx::query_as::<_, GroupRecord>(
            r#"
            UPDATE groups SET updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, admin_id, image_content_type,
                      octet_length(image) AS image_size, created_at, updated_at
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    #[tracing::instrument(level = "debug", skip(self, group), fields(admin_id = %group.admin_id))]
    async fn create(&self, group: NewGroup) -> Result<Group> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, GroupRecord>(
            r#"
            INSERT INTO groups (id, name, description, admin_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, admin_id, image_content_type,
                      octet_length(image) AS image_size, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.admin_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_members(&mut tx, record.id, &group.member_ids).await?;
        tx.commit().await?;

        Ok(record.into_group(group.member_ids))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>> {
        let record = sqlx::query_as::<_, GroupRecord>(
            r#"
            SELECT id, name, description, admin_id, image_content_type,
                   octet_length(image) AS image_size, created_at, updated_at
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.attach_members(record).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Group>> {
        let records = sqlx::query_as::<_, GroupRecord>(
            r#"
            SELECT g.id, g.name, g.description, g.admin_id, g.image_content_type,
                   octet_length(g.image) AS image_size, g.created_at, g.updated_at
            FROM groups g
            JOIN group_members gm ON gm.group_id = g.id
            WHERE gm.user_id = $1
            ORDER BY g.updated_at DESC, g.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let mut members = self.members_of(&ids).await?;

        Ok(records
            .into_iter()
            .map(|record| {
                let member_ids = members.remove(&record.id).unwrap_or_default();
                record.into_group(member_ids)
            })
            .collect())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn group_ids_for_member(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT group_id FROM group_members WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    #[tracing::instrument(level = "debug", skip(self, member_ids), fields(count = member_ids.len()))]
    async fn add_members(&self, group_id: Uuid, member_ids: &[Uuid]) -> Result<Option<Group>> {
        let Some(record) = self.touch(group_id).await? else {
            return Ok(None);
        };
        let mut conn = self.pool.acquire().await?;
        Self::insert_members(&mut conn, group_id, member_ids).await?;
        self.attach_members(Some(record)).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn remove_member(&self, group_id: Uuid, member_id: Uuid) -> Result<Option<Group>> {
        sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        let record = self.touch(group_id).await?;
        self.attach_members(record).await
    }

    #[tracing::instrument(level = "debug", skip(self, changes))]
    async fn update(&self, group_id: Uuid, changes: &GroupChanges) -> Result<Option<Group>> {
        let record = sqlx::query_as::<_, GroupRecord>(
            r#"
            UPDATE groups
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, admin_id, image_content_type,
                      octet_length(image) AS image_size, created_at, updated_at
            "#,
        )
        .bind(group_id)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        self.attach_members(record).await
    }

    #[tracing::instrument(level = "debug", skip(self, image), fields(size = image.data.len()))]
    async fn set_image(&self, group_id: Uuid, image: Image) -> Result<Option<Group>> {
        let record = sqlx::query_as::<_, GroupRecord>(
            r#"
            UPDATE groups
            SET image = $2, image_content_type = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, admin_id, image_content_type,
                      octet_length(image) AS image_size, created_at, updated_at
            "#,
        )
        .bind(group_id)
        .bind(image.data.to_vec())
        .bind(&image.content_type)
        .fetch_optional(&self.pool)
        .await?;

        self.attach_members(record).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_image(&self, group_id: Uuid) -> Result<Option<Image>> {
        let record = sqlx::query_as::<_, ImageRecord>("SELECT image, image_content_type FROM groups WHERE id = $1")
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.and_then(ImageRecord::into_image))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete(&self, group_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1").bind(group_id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
