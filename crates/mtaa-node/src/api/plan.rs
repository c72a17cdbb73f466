//! Planning endpoint.

use axum::{extract::State, Json};
use mtaa_core::{Goal, SurvivalRequest};
use serde::Deserialize;

use super::{api_error, ApiError};
use crate::agent::SurvivalReport;
use crate::state::AppState;

fn default_goal() -> String {
    Goal::default().to_string()
}

fn default_duration() -> i64 {
    7
}

/// Request to plan a stay.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub location: String,
    pub budget: f64,

    /// Goal name, case-insensitive.
    #[serde(default = "default_goal")]
    pub goal: String,

    #[serde(default = "default_duration")]
    pub duration_days: i64,
}

/// Validate the request, then run every category and plan the days.
pub async fn create_plan(
    State(state): State<AppState>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<SurvivalReport>, ApiError> {
    let goal: Goal = req.goal.parse().map_err(api_error)?;

    let request = SurvivalRequest::builder()
        .location(req.location)
        .budget(req.budget)
        .goal(goal)
        .duration_days(req.duration_days)
        .build()
        .map_err(api_error)?;

    let report = state.agent(request).run_all().await.map_err(api_error)?;
    Ok(Json(report))
}
