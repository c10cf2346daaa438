//! Liveness, readiness and metrics endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::services::get_metrics;
use crate::AppState;

/// Health check endpoint for Docker/K8s liveness probes.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "billing-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check: the service is ready once the store answers.
pub async fn readiness_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state
        .store
        .health_check()
        .await
        .map_err(|_| AppError::ServiceUnavailable)?;
    Ok((StatusCode::OK, Json(json!({ "status": "ready" }))))
}

/// Prometheus metrics endpoint.
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
