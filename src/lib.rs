#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use crate::adapters::database::{DbPool, PgGroupRepository, PgMessageRepository, PgUserRepository};
use crate::adapters::memory::{MemoryGroupRepository, MemoryMessageRepository, MemoryUserRepository};
use crate::adapters::repository::{GroupRepository, MessageRepository, UserRepository};
use crate::api::ServiceContainer;
use crate::config::Config;
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::group_service::GroupService;
use crate::services::health_service::HealthService;
use crate::services::message_service::MessageService;
use crate::services::rate_limit_service::RateLimitService;
use std::sync::Arc;
use tokio::sync::watch;

/// Everything the routers need, wired and ready to serve.
#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub health_service: HealthService,
}

#[derive(Debug)]
struct Repositories {
    users: Arc<dyn UserRepository>,
    messages: Arc<dyn MessageRepository>,
    groups: Arc<dyn GroupRepository>,
}

impl Repositories {
    fn postgres(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool.clone())),
            groups: Arc::new(PgGroupRepository::new(pool.clone())),
        }
    }

    fn memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            messages: Arc::new(MemoryMessageRepository::new()),
            groups: Arc::new(MemoryGroupRepository::new()),
        }
    }
}

/// Wires services on top of either a `PostgreSQL` pool or the in-memory store.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    pool: Option<DbPool>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, pool: None }
    }

    #[must_use]
    pub fn with_database(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }

    #[must_use]
    pub fn build(self) -> App {
        let repos = self.pool.as_ref().map_or_else(Repositories::memory, Repositories::postgres);
        if self.pool.is_none() {
            tracing::warn!("No database configured, data will be kept in memory");
        }

        let auth_service = AuthService::new(self.config.auth.clone());
        let account_service = AccountService::new(Arc::clone(&repos.users), auth_service.clone());
        let message_service = MessageService::new(
            Arc::clone(&repos.messages),
            Arc::clone(&repos.groups),
            Arc::clone(&repos.users),
            self.config.messaging.clone(),
        );
        let group_service = GroupService::new(
            Arc::clone(&repos.groups),
            Arc::clone(&repos.messages),
            Arc::clone(&repos.users),
            self.config.messaging.max_image_bytes,
        );
        let rate_limit_service = RateLimitService::new(self.config.server.trusted_proxies.clone());
        let health_service = HealthService::new(self.pool, self.config.health.clone());

        App {
            services: ServiceContainer {
                account_service,
                auth_service,
                message_service,
                group_service,
                rate_limit_service,
            },
            health_service,
        }
    }
}

/// Applies the embedded migrations.
///
/// # Errors
/// Returns an error if a migration fails to apply.
pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!().run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Flips `shutdown_tx` to `true` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach the configured log sink.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line())).unwrap_or_default();
        tracing::error!(panic = %info, location = %location, "Process panicked");
    }));
}
