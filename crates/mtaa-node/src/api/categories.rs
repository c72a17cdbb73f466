//! Single-category lookup.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use mtaa_core::{Category, MtaaError, TaskResult};
use serde::Deserialize;

use super::{api_error, ApiError};
use crate::state::AppState;

/// Query string naming the location.
#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub location: String,
}

impl LocationQuery {
    /// The location, rejected when blank.
    pub fn validated(&self) -> Result<&str, MtaaError> {
        let location = self.location.trim();
        if location.is_empty() {
            return Err(MtaaError::validation("location cannot be empty"));
        }
        Ok(location)
    }
}

/// Fetch one category through the cache.
pub async fn get_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<TaskResult>, ApiError> {
    let category: Category = category.parse().map_err(api_error)?;
    let location = query.validated().map_err(api_error)?;

    Ok(Json(state.orchestrator.fetch_category(category, location).await))
}
