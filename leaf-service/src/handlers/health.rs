use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "leaf-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready once both storage directories are usable.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let uploads = state.uploads.is_ready().await;
    let reports = state.reports.is_ready().await;

    let status = if uploads && reports {
        StatusCode::OK
    } else {
        tracing::warn!(uploads, reports, "Storage not ready");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if status.is_success() { "ready" } else { "not_ready" },
            "checks": { "uploads": uploads, "reports": reports }
        })),
    )
}

pub async fn metrics() -> impl IntoResponse {
    service_core::observability::render_metrics()
}
