use crate::api::schemas::users::UserResponse;
use crate::api::schemas::{ImageInfo, unix_seconds};
use crate::domain::group::GroupView;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMembers {
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub admin_id: Uuid,
    pub admin: Option<UserResponse>,
    pub members: Vec<UserResponse>,
    pub image: Option<ImageInfo>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<GroupView> for GroupResponse {
    fn from(view: GroupView) -> Self {
        let GroupView { group, members, admin } = view;
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            admin_id: group.admin_id,
            admin: admin.map(Into::into),
            members: members.into_iter().map(Into::into).collect(),
            image: group.image.map(Into::into),
            created_at: unix_seconds(group.created_at),
            updated_at: unix_seconds(group.updated_at),
        }
    }
}
