use crate::domain::group::{Group, GroupChanges, NewGroup};
use crate::domain::image::Image;
use crate::domain::message::{Message, NewMessage};
use crate::domain::user::{NewUser, User};
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync + std::fmt::Debug {
    /// # Errors
    /// Returns `AppError::BadRequest` if the email is already registered.
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Users for every id that exists; unknown ids are skipped.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    /// Returns `false` if `friend_id` was already on the list.
    async fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<bool>;

    /// Friend ids in the order they were added.
    async fn friend_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;
}

/// Message storage. Listing methods return messages oldest first and never load image bytes.
#[async_trait]
pub trait MessageRepository: Send + Sync + std::fmt::Debug {
    /// # Errors
    /// Returns `AppError::NotFound` if the recipient or group no longer exists.
    async fn create(&self, message: NewMessage) -> Result<Message>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>>;

    async fn find_image(&self, id: Uuid) -> Result<Option<Image>>;

    /// Direct messages exchanged between `a` and `b`, in both directions.
    async fn list_between(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>>;

    async fn list_for_group(&self, group_id: Uuid) -> Result<Vec<Message>>;

    /// Direct messages sent or received by `user_id` plus messages of the given groups.
    async fn list_involving(&self, user_id: Uuid, group_ids: &[Uuid]) -> Result<Vec<Message>>;

    async fn list_direct_for_user(&self, user_id: Uuid) -> Result<Vec<Message>>;

    async fn delete_for_group(&self, group_id: Uuid) -> Result<u64>;
}

/// Group storage. Methods that modify a group return `None` when it does not exist.
#[async_trait]
pub trait GroupRepository: Send + Sync + std::fmt::Debug {
    async fn create(&self, group: NewGroup) -> Result<Group>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>>;

    /// Groups containing `user_id`, most recently updated first.
    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Group>>;

    async fn group_ids_for_member(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    async fn add_members(&self, group_id: Uuid, member_ids: &[Uuid]) -> Result<Option<Group>>;

    async fn remove_member(&self, group_id: Uuid, member_id: Uuid) -> Result<Option<Group>>;

    async fn update(&self, group_id: Uuid, changes: &GroupChanges) -> Result<Option<Group>>;

    async fn set_image(&self, group_id: Uuid, image: Image) -> Result<Option<Group>>;

    async fn find_image(&self, group_id: Uuid) -> Result<Option<Image>>;

    /// Returns `false` if the group did not exist.
    async fn delete(&self, group_id: Uuid) -> Result<bool>;
}
