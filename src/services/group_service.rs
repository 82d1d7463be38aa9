use crate::adapters::repository::{GroupRepository, MessageRepository, UserRepository};
use crate::domain::group::{Group, GroupChanges, GroupView, NewGroup};
use crate::domain::image::Image;
use crate::domain::user::UserProfile;
use crate::error::{AppError, Result};
use crate::services::load_profiles;
use opentelemetry::{global, metrics::Counter};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    groups_created_total: Counter<u64>,
    groups_deleted_total: Counter<u64>,
    membership_changes_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("chatterbox-server");
        Self {
            groups_created_total: meter
                .u64_counter("groups_created_total")
                .with_description("Total number of groups created")
                .build(),
            groups_deleted_total: meter
                .u64_counter("groups_deleted_total")
                .with_description("Total number of groups deleted")
                .build(),
            membership_changes_total: meter
                .u64_counter("group_membership_changes_total")
                .with_description("Total number of members added to or removed from groups")
                .build(),
        }
    }
}

#[derive(Debug)]
pub struct CreateGroupParams {
    pub name: String,
    pub description: Option<String>,
    pub member_ids: Vec<Uuid>,
}

#[derive(Clone, Debug)]
pub struct GroupService {
    groups: Arc<dyn GroupRepository>,
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    max_image_bytes: usize,
    metrics: Metrics,
}

impl GroupService {
    #[must_use]
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
        max_image_bytes: usize,
    ) -> Self {
        Self { groups, messages, users, max_image_bytes, metrics: Metrics::new() }
    }

    #[must_use]
    pub const fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    #[tracing::instrument(skip(self, params), fields(group_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn create(&self, admin_id: Uuid, params: CreateGroupParams) -> Result<GroupView> {
        let new_group = NewGroup::new(admin_id, &params.name, params.description.as_deref(), &params.member_ids)?;
        self.ensure_users_exist(&new_group.member_ids).await?;

        let group = self.groups.create(new_group).await?;

        tracing::Span::current().record("group_id", tracing::field::display(group.id));
        tracing::info!(members = group.member_ids.len(), "Group created");
        self.metrics.groups_created_total.add(1, &[]);

        self.view(group).await
    }

    /// Groups `user_id` belongs to. Callers may only list their own groups.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn list_for_user(&self, caller: Uuid, user_id: Uuid) -> Result<Vec<GroupView>> {
        if caller != user_id {
            return Err(AppError::forbidden("Access denied"));
        }

        let groups = self.groups.list_for_member(user_id).await?;
        let mut ids: Vec<Uuid> = groups.iter().flat_map(|g| g.member_ids.iter().copied()).collect();
        ids.sort_unstable();
        ids.dedup();
        let profiles = load_profiles(self.users.as_ref(), &ids).await?;

        Ok(groups.into_iter().map(|group| assemble(group, &profiles)).collect())
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get(&self, caller: Uuid, group_id: Uuid) -> Result<GroupView> {
        let group = self.load(group_id).await?;
        group.ensure_member(caller)?;
        self.view(group).await
    }

    #[tracing::instrument(skip(self, name, description), err(level = "warn"))]
    pub async fn update(
        &self,
        caller: Uuid,
        group_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<GroupView> {
        let group = self.load(group_id).await?;
        group.ensure_admin(caller, "update group")?;
        let changes = GroupChanges::new(name, description)?;

        let updated = self.groups.update(group_id, &changes).await?.ok_or_else(group_not_found)?;
        self.view(updated).await
    }

    #[tracing::instrument(skip(self, image), fields(size = image.data.len()), err(level = "warn"))]
    pub async fn set_image(&self, caller: Uuid, group_id: Uuid, image: Image) -> Result<GroupView> {
        let group = self.load(group_id).await?;
        group.ensure_admin(caller, "update group image")?;

        let updated = self.groups.set_image(group_id, image).await?.ok_or_else(group_not_found)?;
        self.view(updated).await
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn image(&self, caller: Uuid, group_id: Uuid) -> Result<Image> {
        let group = self.load(group_id).await?;
        group.ensure_member(caller)?;

        self.groups.find_image(group_id).await?.ok_or_else(|| AppError::not_found("Group image not found"))
    }

    #[tracing::instrument(skip(self, member_ids), fields(requested = member_ids.len()), err(level = "warn"))]
    pub async fn add_members(&self, caller: Uuid, group_id: Uuid, member_ids: &[Uuid]) -> Result<GroupView> {
        let group = self.load(group_id).await?;
        let additions = group.plan_additions(caller, member_ids)?;
        self.ensure_users_exist(&additions).await?;

        let updated = self.groups.add_members(group_id, &additions).await?.ok_or_else(group_not_found)?;

        tracing::info!(added = additions.len(), "Members added to group");
        self.metrics.membership_changes_total.add(u64::try_from(additions.len()).unwrap_or(u64::MAX), &[]);
        self.view(updated).await
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn remove_member(&self, caller: Uuid, group_id: Uuid, member_id: Uuid) -> Result<GroupView> {
        let group = self.load(group_id).await?;
        group.authorize_removal(caller, member_id)?;

        let updated = self.groups.remove_member(group_id, member_id).await?.ok_or_else(group_not_found)?;

        tracing::info!(member_id = %member_id, "Member removed from group");
        self.metrics.membership_changes_total.add(1, &[]);
        self.view(updated).await
    }

    /// Deletes the group together with every message sent to it.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn delete(&self, caller: Uuid, group_id: Uuid) -> Result<()> {
        let group = self.load(group_id).await?;
        group.ensure_admin(caller, "delete group")?;

        let removed = self.messages.delete_for_group(group_id).await?;
        if !self.groups.delete(group_id).await? {
            return Err(group_not_found());
        }

        tracing::info!(messages_removed = removed, "Group deleted");
        self.metrics.groups_deleted_total.add(1, &[]);
        Ok(())
    }

    async fn load(&self, group_id: Uuid) -> Result<Group> {
        self.groups.find_by_id(group_id).await?.ok_or_else(group_not_found)
    }

    async fn ensure_users_exist(&self, ids: &[Uuid]) -> Result<()> {
        let found = self.users.find_many(ids).await?;
        if found.len() == ids.len() {
            Ok(())
        } else {
            Err(AppError::bad_request("One or more users not found"))
        }
    }

    async fn view(&self, group: Group) -> Result<GroupView> {
        let profiles = load_profiles(self.users.as_ref(), &group.member_ids).await?;
        Ok(assemble(group, &profiles))
    }
}

fn group_not_found() -> AppError {
    AppError::not_found("Group not found")
}

fn assemble(group: Group, profiles: &HashMap<Uuid, UserProfile>) -> GroupView {
    let members = group.member_ids.iter().filter_map(|id| profiles.get(id).cloned()).collect();
    let admin = profiles.get(&group.admin_id).cloned();
    GroupView { group, members, admin }
}
