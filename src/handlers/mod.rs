pub mod photos;
pub mod upload;

use crate::models::{HealthResponse, RootResponse};
use crate::AppError;
use axum::Json;

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Doodle Sketch API is running".to_string(),
    })
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Same as `/health`, for clients that only proxy `/api/*`.
pub async fn api_health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
