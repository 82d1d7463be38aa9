use crate::adapters::repository::UserRepository;
use crate::domain::auth_session::AuthSession;
use crate::domain::user::{NewUser, Registration, User, UserProfile, normalize_email};
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthService;
use crate::services::load_profiles;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct AccountMetrics {
    users_registered_total: Counter<u64>,
    login_total: Counter<u64>,
    friends_added_total: Counter<u64>,
}

impl AccountMetrics {
    fn new() -> Self {
        let meter = global::meter("chatterbox-server");
        Self {
            users_registered_total: meter
                .u64_counter("users_registered_total")
                .with_description("Total number of successful user registrations")
                .build(),
            login_total: meter
                .u64_counter("auth_login_total")
                .with_description("Total number of login attempts by outcome")
                .build(),
            friends_added_total: meter
                .u64_counter("friends_added_total")
                .with_description("Total number of friends added")
                .build(),
        }
    }
}

/// Input for [`AccountService::register`], straight from the request body.
#[derive(Debug)]
pub struct RegisterParams {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    auth_service: AuthService,
    metrics: AccountMetrics,
}

impl AccountService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, auth_service: AuthService) -> Self {
        Self { users, auth_service, metrics: AccountMetrics::new() }
    }

    #[tracing::instrument(skip(self, params), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn register(&self, params: RegisterParams) -> Result<AuthSession> {
        let registration = Registration::parse(&params.email, params.password, &params.first_name, &params.last_name)?;

        if self.users.find_by_email(&registration.email).await?.is_some() {
            return Err(AppError::bad_request("User already exists"));
        }

        let password_hash = self.auth_service.hash_password(&registration.password).await?;
        let user = self
            .users
            .create(NewUser {
                email: registration.email,
                password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
            })
            .await?;

        tracing::Span::current().record("user_id", tracing::field::display(user.id));
        tracing::info!("User registered successfully");
        self.metrics.users_registered_total.add(1, &[]);

        self.session_for(&user)
    }

    #[tracing::instrument(skip(self, email, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let Ok(email) = normalize_email(email) else {
            return Err(self.login_failed("malformed_email"));
        };
        if password.is_empty() {
            return Err(self.login_failed("missing_password"));
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::warn!("Login failed: user not found");
            return Err(self.login_failed("unknown_user"));
        };

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        if !self.auth_service.verify_password(password, &user.password_hash).await? {
            tracing::warn!("Login failed: invalid password");
            return Err(self.login_failed("invalid_password"));
        }

        self.metrics.login_total.add(1, &[KeyValue::new("status", "success")]);
        self.session_for(&user)
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Adds the user with `friend_email` to the caller's friends list. The relation is one-way.
    #[tracing::instrument(skip(self, friend_email), err(level = "warn"))]
    pub async fn add_friend(&self, user_id: Uuid, friend_email: &str) -> Result<UserProfile> {
        if friend_email.trim().is_empty() {
            return Err(AppError::bad_request("Friend email is required"));
        }
        let email = normalize_email(friend_email)?;

        let friend = self.users.find_by_email(&email).await?.ok_or_else(|| AppError::not_found("User not found"))?;
        if friend.id == user_id {
            return Err(AppError::bad_request("Cannot add yourself as a friend"));
        }

        if !self.users.add_friend(user_id, friend.id).await? {
            return Err(AppError::bad_request("User is already your friend"));
        }

        tracing::info!(friend_id = %friend.id, "Friend added");
        self.metrics.friends_added_total.add(1, &[]);
        Ok(UserProfile::from(&friend))
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn list_friends(&self, user_id: Uuid) -> Result<Vec<UserProfile>> {
        let ids = self.users.friend_ids(user_id).await?;
        self.profiles_in_order(&ids).await
    }

    async fn profiles_in_order(&self, ids: &[Uuid]) -> Result<Vec<UserProfile>> {
        let mut profiles = load_profiles(self.users.as_ref(), ids).await?;
        Ok(ids.iter().filter_map(|id| profiles.remove(id)).collect())
    }

    fn session_for(&self, user: &User) -> Result<AuthSession> {
        let issued = self.auth_service.issue_token(user)?;
        Ok(AuthSession { token: issued.token, expires_at: issued.expires_at, user: UserProfile::from(user) })
    }

    fn login_failed(&self, reason: &'static str) -> AppError {
        self.metrics.login_total.add(1, &[KeyValue::new("status", "failure"), KeyValue::new("reason", reason)]);
        AppError::InvalidCredentials
    }
}
