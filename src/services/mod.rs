use crate::adapters::repository::UserRepository;
use crate::domain::user::UserProfile;
use crate::error::Result;
use std::collections::HashMap;
use uuid::Uuid;

pub mod account_service;
pub mod auth_service;
pub mod group_service;
pub mod health_service;
pub mod message_service;
pub mod rate_limit_service;

/// Public profiles keyed by user id. Unknown ids are absent from the map.
pub(crate) async fn load_profiles(users: &dyn UserRepository, ids: &[Uuid]) -> Result<HashMap<Uuid, UserProfile>> {
    let found = users.find_many(ids).await?;
    Ok(found.iter().map(|user| (user.id, UserProfile::from(user))).collect())
}
