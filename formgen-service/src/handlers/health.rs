use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::startup::AppState;

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is running")
    ),
    tag = "Observability"
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "formgen-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe: passes when the LLM provider accepts our credentials
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "LLM provider reachable"),
        (status = 503, description = "LLM provider unavailable")
    ),
    tag = "Observability"
)]
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let provider = state.generation.provider();
    match provider.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "provider": provider.name()
            })),
        ),
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "provider": provider.name(),
                    "error": e.to_string()
                })),
            )
        }
    }
}
