//! Cache maintenance endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mtaa_cache::CacheStats;
use mtaa_core::Category;
use serde::Serialize;
use tracing::info;

use super::categories::LocationQuery;
use super::{api_error, ApiError};
use crate::state::AppState;

/// Response after a purge.
#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub removed: usize,
}

/// Describe the cache contents.
pub async fn stats(State(state): State<AppState>) -> Result<Json<CacheStats>, ApiError> {
    let stats = state.cache().stats().await.map_err(api_error)?;
    Ok(Json(stats))
}

/// Remove expired and unreadable entries.
pub async fn purge(State(state): State<AppState>) -> Result<Json<PurgeResponse>, ApiError> {
    let removed = state.cache().purge_expired().await.map_err(api_error)?;
    info!("Purged {} cache entries", removed);
    Ok(Json(PurgeResponse { removed }))
}

/// Drop the cached data of one category at a location.
pub async fn invalidate(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<LocationQuery>,
) -> Result<StatusCode, ApiError> {
    let category: Category = category.parse().map_err(api_error)?;
    let location = query.validated().map_err(api_error)?;

    state
        .orchestrator
        .invalidate(category, location)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}
