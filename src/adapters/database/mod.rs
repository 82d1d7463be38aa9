pub mod group_repo;
pub mod message_repo;
pub mod records;
pub mod user_repo;

pub use group_repo::PgGroupRepository;
pub use message_repo::PgMessageRepository;
pub use user_repo::PgUserRepository;

use crate::config::DatabaseConfig;
use backon::{ExponentialBuilder, Retryable};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

pub type DbPool = Pool<Postgres>;

pub(crate) const UNIQUE_VIOLATION: &str = "23505";
pub(crate) const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Initializes the database connection pool, retrying with exponential backoff.
///
/// # Errors
/// Returns `sqlx::Error` if every connection attempt fails.
pub async fn init_pool(url: &str, config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let connect = || async {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(url)
            .await
    };

    connect
        .retry(ExponentialBuilder::default().with_max_times(config.connect_retries))
        .notify(|err: &sqlx::Error, dur: Duration| {
            tracing::warn!(error = %err, retry_in_ms = dur.as_millis(), "Database connection failed, retrying");
        })
        .await
}

/// Whether a query failed on the given Postgres constraint class.
pub(crate) fn is_violation(error: &sqlx::Error, code: &str) -> bool {
    matches!(error, sqlx::Error::Database(e) if e.code().as_deref() == Some(code))
}
