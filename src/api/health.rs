use crate::api::MgmtState;
use crate::api::schemas::health::{HealthResponse, StatusResponse};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: checks that the backing store answers in time.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let (status_code, database) = match state.health_service.check_db().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, component = "database", "Readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "error")
        }
    };

    let response = HealthResponse {
        status: if status_code == StatusCode::OK { "ok" } else { "error" }.to_string(),
        database: database.to_string(),
        store: state.health_service.store().to_string(),
    };

    (status_code, Json(response))
}

/// Plain health check on the public listener.
pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok".to_string() })
}
