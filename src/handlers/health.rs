use axum::{http::Uri, Json};
use serde::Serialize;

use crate::error::AppError;
use crate::response::ApiResponse;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness check
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(
        "Service is healthy",
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}

/// Router fallback for unknown paths
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {} not found", uri.path()))
}
