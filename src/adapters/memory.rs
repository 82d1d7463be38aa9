//! Process-local storage used when no database URL is configured.
//! Data is lost on restart.

use crate::adapters::repository::{GroupRepository, MessageRepository, UserRepository};
use crate::domain::group::{Group, GroupChanges, NewGroup};
use crate::domain::image::Image;
use crate::domain::message::{Message, MessageTarget, NewMessage};
use crate::domain::user::{NewUser, User};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct UserState {
    users: Vec<User>,
    friends: HashMap<Uuid, Vec<Uuid>>,
}

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    state: RwLock<UserState>,
}

impl MemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::bad_request("User already exists"));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: OffsetDateTime::now_utc(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.state.read().await.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        Ok(self.state.read().await.users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let friends = state.friends.entry(user_id).or_default();
        if friends.contains(&friend_id) {
            return Ok(false);
        }
        friends.push(friend_id);
        Ok(true)
    }

    async fn friend_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self.state.read().await.friends.get(&user_id).cloned().unwrap_or_default())
    }
}

#[derive(Debug)]
struct StoredMessage {
    message: Message,
    image: Option<Image>,
}

#[derive(Debug, Default)]
pub struct MemoryMessageRepository {
    messages: RwLock<Vec<StoredMessage>>,
}

impl MemoryMessageRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect(&self, keep: impl Fn(&Message) -> bool + Send) -> Vec<Message> {
        self.messages.read().await.iter().map(|s| &s.message).filter(|&m| keep(m)).cloned().collect()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn create(&self, message: NewMessage) -> Result<Message> {
        let stored = Message {
            id: Uuid::now_v7(),
            sender_id: message.sender_id,
            target: message.target,
            contents: message.contents,
            image: message.image.as_ref().map(Image::meta),
            created_at: OffsetDateTime::now_utc(),
        };
        self.messages.write().await.push(StoredMessage { message: stored.clone(), image: message.image });
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>> {
        Ok(self.messages.read().await.iter().find(|s| s.message.id == id).map(|s| s.message.clone()))
    }

    async fn find_image(&self, id: Uuid) -> Result<Option<Image>> {
        Ok(self.messages.read().await.iter().find(|s| s.message.id == id).and_then(|s| s.image.clone()))
    }

    async fn list_between(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>> {
        Ok(self
            .collect(|m| {
                (m.target == MessageTarget::Direct(b) && m.sender_id == a)
                    || (m.target == MessageTarget::Direct(a) && m.sender_id == b)
            })
            .await)
    }

    async fn list_for_group(&self, group_id: Uuid) -> Result<Vec<Message>> {
        Ok(self.collect(|m| m.target == MessageTarget::Group(group_id)).await)
    }

    async fn list_involving(&self, user_id: Uuid, group_ids: &[Uuid]) -> Result<Vec<Message>> {
        Ok(self
            .collect(|m| match m.target {
                MessageTarget::Direct(recipient) => m.sender_id == user_id || recipient == user_id,
                MessageTarget::Group(group) => group_ids.contains(&group),
            })
            .await)
    }

    async fn list_direct_for_user(&self, user_id: Uuid) -> Result<Vec<Message>> {
        Ok(self
            .collect(|m| matches!(m.target, MessageTarget::Direct(_)) && m.is_direct_participant(user_id))
            .await)
    }

    async fn delete_for_group(&self, group_id: Uuid) -> Result<u64> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|s| s.message.target != MessageTarget::Group(group_id));
        Ok(u64::try_from(before - messages.len()).unwrap_or(u64::MAX))
    }
}

#[derive(Debug)]
struct StoredGroup {
    group: Group,
    image: Option<Image>,
}

#[derive(Debug, Default)]
pub struct MemoryGroupRepository {
    groups: RwLock<Vec<StoredGroup>>,
}

impl MemoryGroupRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify(&self, group_id: Uuid, apply: impl FnOnce(&mut StoredGroup) + Send) -> Option<Group> {
        let mut groups = self.groups.write().await;
        let stored = groups.iter_mut().find(|s| s.group.id == group_id)?;
        apply(stored);
        stored.group.updated_at = OffsetDateTime::now_utc();
        Some(stored.group.clone())
    }
}

#[async_trait]
impl GroupRepository for MemoryGroupRepository {
    async fn create(&self, group: NewGroup) -> Result<Group> {
        let now = OffsetDateTime::now_utc();
        let group = Group {
            id: Uuid::new_v4(),
            name: group.name,
            description: group.description,
            admin_id: group.admin_id,
            member_ids: group.member_ids,
            image: None,
            created_at: now,
            updated_at: now,
        };
        self.groups.write().await.push(StoredGroup { group: group.clone(), image: None });
        Ok(group)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>> {
        Ok(self.groups.read().await.iter().find(|s| s.group.id == id).map(|s| s.group.clone()))
    }

    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Group>> {
        let mut groups: Vec<Group> =
            self.groups.read().await.iter().filter(|s| s.group.is_member(user_id)).map(|s| s.group.clone()).collect();
        groups.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(groups)
    }

    async fn group_ids_for_member(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self.groups.read().await.iter().filter(|s| s.group.is_member(user_id)).map(|s| s.group.id).collect())
    }

    async fn add_members(&self, group_id: Uuid, member_ids: &[Uuid]) -> Result<Option<Group>> {
        Ok(self
            .modify(group_id, |stored| {
                for &id in member_ids {
                    if !stored.group.member_ids.contains(&id) {
                        stored.group.member_ids.push(id);
                    }
                }
            })
            .await)
    }

    async fn remove_member(&self, group_id: Uuid, member_id: Uuid) -> Result<Option<Group>> {
        Ok(self.modify(group_id, |stored| stored.group.member_ids.retain(|&id| id != member_id)).await)
    }

    async fn update(&self, group_id: Uuid, changes: &GroupChanges) -> Result<Option<Group>> {
        Ok(self
            .modify(group_id, |stored| {
                if let Some(name) = &changes.name {
                    stored.group.name.clone_from(name);
                }
                if let Some(description) = &changes.description {
                    stored.group.description.clone_from(description);
                }
            })
            .await)
    }

    async fn set_image(&self, group_id: Uuid, image: Image) -> Result<Option<Group>> {
        Ok(self
            .modify(group_id, |stored| {
                stored.group.image = Some(image.meta());
                stored.image = Some(image);
            })
            .await)
    }

    async fn find_image(&self, group_id: Uuid) -> Result<Option<Image>> {
        Ok(self.groups.read().await.iter().find(|s| s.group.id == group_id).and_then(|s| s.image.clone()))
    }

    async fn delete(&self, group_id: Uuid) -> Result<bool> {
        let mut groups = self.groups.write().await;
        let before = groups.len();
        groups.retain(|s| s.group.id != group_id);
        Ok(groups.len() < before)
    }
}
