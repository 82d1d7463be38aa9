use crate::api::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

/// Records the limiter's verdict for every request that reaches the API router.
pub async fn log_rate_limit_events(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let retry_after = response.headers().get(header::RETRY_AFTER).and_then(|v| v.to_str().ok());
    state.rate_limit_service.log_decision(response.status(), retry_after);

    response
}
