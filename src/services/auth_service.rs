use crate::config::AuthConfig;
use crate::domain::auth::{Claims, Password};
use crate::domain::user::User;
use crate::error::{AppError, Result};
use opentelemetry::{KeyValue, global, metrics::Counter};
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    tokens_issued_total: Counter<u64>,
    tokens_rejected_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("chatterbox-server");
        Self {
            tokens_issued_total: meter
                .u64_counter("auth_tokens_issued_total")
                .with_description("Total number of access tokens issued")
                .build(),
            tokens_rejected_total: meter
                .u64_counter("auth_tokens_rejected_total")
                .with_description("Total number of access tokens that failed verification")
                .build(),
        }
    }
}

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

#[derive(Clone, Debug)]
pub struct AuthService {
    config: AuthConfig,
    metrics: Metrics,
}

impl AuthService {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self { config, metrics: Metrics::new() }
    }

    /// # Errors
    /// Returns `AppError::Internal` if signing fails.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id), err(level = "warn"))]
    pub fn issue_token(&self, user: &User) -> Result<IssuedToken> {
        let claims = Claims::new(user.id, user.email.clone(), self.config.token_ttl_secs);
        let token = claims.encode(&self.config.jwt_secret)?;
        let expires_at = i64::try_from(claims.exp).unwrap_or(i64::MAX);

        self.metrics.tokens_issued_total.add(1, &[]);
        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies a bearer token and returns the user id it was issued to.
    ///
    /// # Errors
    /// Returns `AppError::InvalidToken` if the signature or expiry check fails.
    pub fn verify_token(&self, token: &str) -> Result<Uuid> {
        Claims::decode(token, &self.config.jwt_secret).map(|claims| claims.sub).inspect_err(|_| {
            self.metrics.tokens_rejected_total.add(1, &[KeyValue::new("reason", "invalid")]);
        })
    }

    #[tracing::instrument(err, skip(self, password))]
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || Password::hash(&password)).await.map_err(|_| AppError::Internal)?
    }

    #[tracing::instrument(err, skip(self, password, password_hash))]
    pub async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || Password::verify(&password, &password_hash))
            .await
            .map_err(|_| AppError::Internal)?
    }
}
