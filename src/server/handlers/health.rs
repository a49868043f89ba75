//! Liveness endpoint.

use axum::{response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

/// Health check endpoint for container orchestration.
pub async fn healthz() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().timestamp_millis(),
    }))
}
