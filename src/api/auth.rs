use crate::api::AppState;
use crate::api::extract::ApiJson;
use crate::api::middleware::AuthUser;
use crate::api::schemas::auth::{AuthResponse, Login, Registration};
use crate::api::schemas::users::UserResponse;
use crate::error::Result;
use crate::services::account_service::RegisterParams;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Registration>,
) -> Result<impl IntoResponse> {
    let session = state
        .account_service
        .register(RegisterParams {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse::from(session))))
}

pub async fn login(State(state): State<AppState>, ApiJson(payload): ApiJson<Login>) -> Result<impl IntoResponse> {
    let session = state.account_service.login(&payload.email, &payload.password).await?;
    Ok(Json(AuthResponse::from(session)))
}

pub async fn me(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let profile = state.account_service.profile(auth_user.user_id).await?;
    Ok(Json(UserResponse::from(profile)))
}
