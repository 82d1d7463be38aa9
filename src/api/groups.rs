use crate::api::AppState;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::AuthUser;
use crate::api::schemas::groups::{AddMembers, CreateGroup, GroupResponse, UpdateGroup};
use crate::api::uploads::{ImageUpload, image_response};
use crate::error::Result;
use crate::services::group_service::CreateGroupParams;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

pub async fn create_group(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateGroup>,
) -> Result<impl IntoResponse> {
    let params =
        CreateGroupParams { name: payload.name, description: payload.description, member_ids: payload.member_ids };
    let view = state.group_service.create(auth_user.user_id, params).await?;
    Ok((StatusCode::CREATED, Json(GroupResponse::from(view))))
}

pub async fn list_user_groups(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let views = state.group_service.list_for_user(auth_user.user_id, user_id).await?;
    Ok(Json(views.into_iter().map(GroupResponse::from).collect::<Vec<_>>()))
}

pub async fn get_group(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.group_service.get(auth_user.user_id, group_id).await?;
    Ok(Json(GroupResponse::from(view)))
}

pub async fn update_group(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateGroup>,
) -> Result<impl IntoResponse> {
    let view = state
        .group_service
        .update(auth_user.user_id, group_id, payload.name.as_deref(), payload.description.as_deref())
        .await?;
    Ok(Json(GroupResponse::from(view)))
}

pub async fn set_group_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
    ImageUpload(image): ImageUpload,
) -> Result<impl IntoResponse> {
    let view = state.group_service.set_image(auth_user.user_id, group_id, image).await?;
    Ok(Json(GroupResponse::from(view)))
}

pub async fn get_group_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let image = state.group_service.image(auth_user.user_id, group_id).await?;
    Ok(image_response(image))
}

pub async fn add_members(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddMembers>,
) -> Result<impl IntoResponse> {
    let view = state.group_service.add_members(auth_user.user_id, group_id, &payload.member_ids).await?;
    Ok(Json(GroupResponse::from(view)))
}

pub async fn remove_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath((group_id, member_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let view = state.group_service.remove_member(auth_user.user_id, group_id, member_id).await?;
    Ok(Json(GroupResponse::from(view)))
}

pub async fn delete_group(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.group_service.delete(auth_user.user_id, group_id).await?;
    Ok(Json(json!({ "message": "Group deleted successfully" })))
}
