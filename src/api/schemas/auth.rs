use crate::api::schemas::users::UserResponse;
use crate::domain::auth_session::AuthSession;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "firstname")]
    pub first_name: String,
    #[serde(default, alias = "lastname")]
    pub last_name: String,
}

#[derive(Deserialize)]
pub struct Login {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: i64,
    pub user: UserResponse,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self { token: session.token, expires_at: session.expires_at, user: session.user.into() }
    }
}
