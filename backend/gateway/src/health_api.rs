//! Liveness probe and the JSON 404 fallback.

use axum::{Json, http::StatusCode};
use serde::Serialize;

use crate::response::ApiError;

#[derive(Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub message: &'static str,
}

/// Handler for `GET /health`
pub async fn health() -> (StatusCode, Json<HealthReport>) {
    (
        StatusCode::OK,
        Json(HealthReport {
            status: "OK",
            message: "Server is running",
        }),
    )
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}
