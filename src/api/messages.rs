use crate::api::AppState;
use crate::api::extract::{ApiPath, ApiQuery};
use crate::api::middleware::AuthUser;
use crate::api::schemas::messages::{ConversationResponse, MessageQuery, MessageResponse};
use crate::api::uploads::{MessageForm, image_response};
use crate::domain::message::MessageFilter;
use crate::error::Result;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    MessageForm(draft): MessageForm,
) -> Result<impl IntoResponse> {
    let view = state.message_service.send(auth_user.user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::from(view))))
}

pub async fn list_messages(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MessageQuery>,
) -> Result<impl IntoResponse> {
    let filter = MessageFilter::from_query(auth_user.user_id, query.sender, query.receiver, query.group)?;
    let views = state.message_service.list(auth_user.user_id, filter).await?;
    Ok(Json(views.into_iter().map(MessageResponse::from).collect::<Vec<_>>()))
}

pub async fn get_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.message_service.get(auth_user.user_id, id).await?;
    Ok(Json(MessageResponse::from(view)))
}

pub async fn get_message_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let image = state.message_service.image(auth_user.user_id, id).await?;
    Ok(image_response(image))
}

pub async fn conversations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let entries = state.message_service.conversations(auth_user.user_id, user_id).await?;
    Ok(Json(entries.into_iter().map(ConversationResponse::from).collect::<Vec<_>>()))
}
