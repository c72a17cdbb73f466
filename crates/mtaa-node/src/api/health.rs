//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,

    /// Entries currently held by the cache, `None` if it could not be read.
    pub cache_entries: Option<usize>,

    /// Entries past their TTL, awaiting a purge.
    pub expired_entries: Option<usize>,
}

/// Health check endpoint.
///
/// An unreadable cache degrades the status rather than failing the check.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = match state.cache().stats().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!("Health check could not read cache stats: {}", e);
            None
        }
    };

    let status = if stats.is_some() { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_entries: stats.as_ref().map(|s| s.total_entries),
        expired_entries: stats.as_ref().map(|s| s.expired_entries),
    })
}
