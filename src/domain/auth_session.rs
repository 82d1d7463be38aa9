use crate::domain::user::UserProfile;

/// What a successful register or login hands back to the client.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub(crate) token: String,
    pub(crate) expires_at: i64,
    pub(crate) user: UserProfile,
}
