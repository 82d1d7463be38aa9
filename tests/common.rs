#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    missing_debug_implementations,
    unreachable_pub,
    dead_code
)]

use chatterbox_server::AppBuilder;
use chatterbox_server::adapters::database::{self, DbPool};
use chatterbox_server::api::{MgmtState, app_router, mgmt_router};
use chatterbox_server::config::{
    AuthConfig, Config, DatabaseConfig, HealthConfig, LogFormat, MessagingConfig, RateLimitConfig, ServerConfig,
    TelemetryConfig,
};
use reqwest::Response;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("chatterbox_server=debug".parse().unwrap())
            .add_directive("sqlx=warn".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

pub fn get_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mgmt_port: 0,
            shutdown_timeout_secs: 1,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            trusted_proxies: vec!["127.0.0.1/32".parse().unwrap(), "::1/128".parse().unwrap()],
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 60,
            max_lifetime_secs: 300,
            connect_retries: 2,
        },
        auth: AuthConfig { jwt_secret: "test_secret".to_string(), token_ttl_secs: 3600 },
        rate_limit: RateLimitConfig { per_second: 10_000, burst: 10_000, auth_per_second: 10_000, auth_burst: 10_000 },
        messaging: MessagingConfig { max_contents_chars: 500, max_image_bytes: 64 * 1024 },
        health: HealthConfig { db_timeout_ms: 2000 },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

/// Connects to `DATABASE_URL` and applies migrations, or returns `None` when it is unset.
pub async fn get_test_pool() -> Option<DbPool> {
    setup_tracing();
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = database::init_pool(&url, &get_test_config().database)
        .await
        .expect("Failed to connect to DB. Is Postgres running?");
    chatterbox_server::run_migrations(&pool).await.expect("Failed to run migrations");
    Some(pool)
}

pub struct TestUser {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub config: Config,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        Self::start(config, None).await
    }

    pub async fn spawn_with_pool(pool: DbPool) -> Self {
        Self::start(get_test_config(), Some(pool)).await
    }

    async fn start(config: Config, pool: Option<DbPool>) -> Self {
        setup_tracing();

        let mut builder = AppBuilder::new(config.clone());
        if let Some(pool) = pool {
            builder = builder.with_database(pool);
        }
        let app = builder.build();

        let router = app_router(config.clone(), app.services).unwrap();
        let mgmt = mgmt_router(MgmtState { health_service: app.health_service });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self {
            server_url: format!("http://{server_addr}"),
            mgmt_url: format!("http://{mgmt_addr}"),
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.server_url, path)
    }

    pub async fn register_user(&self, name: &str) -> TestUser {
        let email = format!("{name}_{}@example.com", &Uuid::new_v4().simple().to_string()[..8]);
        let resp = self
            .client
            .post(self.url("/user/register"))
            .json(&json!({
                "email": email,
                "password": "password123",
                "firstName": name,
                "lastName": "Tester",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED, "registration of {name} failed");

        let body: Value = resp.json().await.unwrap();
        TestUser {
            user_id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            email,
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn get(&self, path: &str, token: &str) -> Response {
        self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    pub async fn post_json(&self, path: &str, token: &str, body: &Value) -> Response {
        self.client.post(self.url(path)).bearer_auth(token).json(body).send().await.unwrap()
    }

    pub async fn patch_json(&self, path: &str, token: &str, body: &Value) -> Response {
        self.client.patch(self.url(path)).bearer_auth(token).json(body).send().await.unwrap()
    }

    pub async fn delete(&self, path: &str, token: &str) -> Response {
        self.client.delete(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    pub async fn send_text(&self, token: &str, recipient: Uuid, contents: &str) -> Value {
        let resp = self.post_json("/messages", token, &json!({ "contents": contents, "recipient": recipient })).await;
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        resp.json().await.unwrap()
    }

    pub async fn create_group(&self, token: &str, name: &str, members: &[Uuid]) -> Value {
        let resp = self.post_json("/groups", token, &json!({ "name": name, "memberIds": members })).await;
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        resp.json().await.unwrap()
    }

    pub async fn add_friend(&self, token: &str, email: &str) -> Response {
        self.post_json("/messages/friends/add", token, &json!({ "friendEmail": email })).await
    }
}
