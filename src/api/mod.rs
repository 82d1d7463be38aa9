use crate::api::rate_limit::log_rate_limit_events;
use crate::config::Config;
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::group_service::GroupService;
use crate::services::health_service::HealthService;
use crate::services::message_service::MessageService;
use crate::services::rate_limit_service::RateLimitService;
use anyhow::Context;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, Request, header};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod extract;
pub mod friends;
pub mod groups;
pub mod health;
pub mod messages;
pub mod middleware;
pub mod rate_limit;
pub mod schemas;
pub mod uploads;

// multipart framing and text fields on top of the image itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub message_service: MessageService,
    pub group_service: GroupService,
    pub rate_limit_service: RateLimitService,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub message_service: MessageService,
    pub group_service: GroupService,
    pub rate_limit_service: RateLimitService,
}

/// Configures and returns the primary application router.
///
/// # Errors
/// Returns an error if the rate limiter configuration cannot be constructed.
pub fn app_router(config: Config, services: ServiceContainer) -> anyhow::Result<Router> {
    let std_interval_ns = 1_000_000_000 / config.rate_limit.per_second.max(1);
    let standard_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(std_interval_ns))
            .burst_size(config.rate_limit.burst)
            .key_extractor(services.rate_limit_service.extractor.clone())
            .finish()
            .context("Failed to build standard rate limiter config")?,
    );

    // Auth tier: stricter limits for password hashing endpoints
    let auth_interval_ns = 1_000_000_000 / config.rate_limit.auth_per_second.max(1);
    let auth_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(auth_interval_ns))
            .burst_size(config.rate_limit.auth_burst)
            .key_extractor(services.rate_limit_service.extractor.clone())
            .finish()
            .context("Failed to build auth rate limiter config")?,
    );

    let body_limit = config.messaging.max_image_bytes.saturating_add(FORM_OVERHEAD_BYTES);
    let cors = cors_layer(&config.server.cors_allowed_origins);

    let state = AppState {
        config,
        account_service: services.account_service,
        auth_service: services.auth_service,
        message_service: services.message_service,
        group_service: services.group_service,
        rate_limit_service: services.rate_limit_service,
    };

    let auth_routes = Router::new()
        .route("/user/register", post(auth::register))
        .route("/user/login", post(auth::login))
        .layer(GovernorLayer::new(auth_conf));

    let api_routes = Router::new()
        .route("/user/me", get(auth::me))
        .route("/groups", post(groups::create_group))
        .route("/groups/user/{userId}", get(groups::list_user_groups))
        .route(
            "/groups/{groupId}",
            get(groups::get_group).patch(groups::update_group).delete(groups::delete_group),
        )
        .route("/groups/{groupId}/image", put(groups::set_group_image).get(groups::get_group_image))
        .route("/groups/{groupId}/members", post(groups::add_members))
        .route("/groups/{groupId}/members/{memberId}", delete(groups::remove_member))
        .route("/messages", post(messages::send_message).get(messages::list_messages))
        .route("/messages/conversations/{userId}", get(messages::conversations))
        .route("/messages/friends/add", post(friends::add_friend))
        .route("/messages/friends/{userId}", get(friends::list_friends))
        .route("/messages/{id}", get(messages::get_message))
        .route("/messages/{id}/image", get(messages::get_message_image))
        .layer(GovernorLayer::new(standard_conf));

    Ok(Router::new()
        .route("/health", get(health::health))
        .nest("/api", auth_routes.merge(api_routes))
        .layer(from_fn_with_state(state.clone(), log_rate_limit_events))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                        let status = response.status();
                        tracing::Span::current().record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(HeaderName::from_static("x-request-id"), MakeRequestUuid))
        .layer(cors)
        .with_state(state))
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin.trim())
                .inspect_err(|_| tracing::warn!(origin = %origin, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
