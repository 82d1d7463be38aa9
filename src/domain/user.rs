use crate::error::{AppError, Result};
use time::OffsetDateTime;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_CHARS: usize = 50;

#[derive(Debug, Clone)]
pub struct User {
    pub(crate) id: Uuid,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) created_at: OffsetDateTime,
}

/// The fields of a user that other users may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Registration input that passed shape validation. The password is still plaintext.
#[derive(Debug)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl Registration {
    /// # Errors
    /// Returns `AppError::BadRequest` naming the first invalid field.
    pub fn parse(email: &str, password: String, first_name: &str, last_name: &str) -> Result<Self> {
        let first_name = parse_name(first_name, "First name")?;
        let last_name = parse_name(last_name, "Last name")?;
        let email = normalize_email(email)?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request(format!("Password must be at least {MIN_PASSWORD_LEN} characters")));
        }

        Ok(Self { email, password, first_name, last_name })
    }
}

fn parse_name(raw: &str, field: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::bad_request(format!("{field} must be at most {MAX_NAME_CHARS} characters")));
    }
    Ok(name.to_string())
}

/// Trims and lowercases an email address after checking its shape.
///
/// # Errors
/// Returns `AppError::BadRequest` if the address is empty or malformed.
pub fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::bad_request("Email is required"));
    }
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("Email is not valid"));
    }
    Ok(email)
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
