//! HTTP API.

use axum::{
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use mtaa_core::MtaaError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod cache;
pub mod categories;
pub mod health;
pub mod plan;

/// Error shape returned by every handler.
pub type ApiError = (StatusCode, String);

/// Map a domain error onto an HTTP status.
pub fn api_error(err: MtaaError) -> ApiError {
    let status = match &err {
        MtaaError::Validation { .. } => StatusCode::BAD_REQUEST,
        MtaaError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Create the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))

        // Planning
        .route("/api/v1/plan", post(plan::create_plan))
        .route("/api/v1/categories/:category", get(categories::get_category))

        // Cache maintenance
        .route("/api/v1/cache/stats", get(cache::stats))
        .route("/api/v1/cache/purge", post(cache::purge))
        .route("/api/v1/cache/:category", delete(cache::invalidate))

        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
