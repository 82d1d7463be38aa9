use crate::api::AppState;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::AuthUser;
use crate::api::schemas::messages::AddFriend;
use crate::api::schemas::users::UserResponse;
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn add_friend(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AddFriend>,
) -> Result<impl IntoResponse> {
    let friend = state.account_service.add_friend(auth_user.user_id, &payload.friend_email).await?;
    Ok(Json(UserResponse::from(friend)))
}

pub async fn list_friends(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    if auth_user.user_id != user_id {
        return Err(AppError::forbidden("Access denied"));
    }

    let friends = state.account_service.list_friends(user_id).await?;
    Ok(Json(friends.into_iter().map(UserResponse::from).collect::<Vec<_>>()))
}
