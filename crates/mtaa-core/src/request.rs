//! Survival requests and cache-key derivation.
//!
//! A [`SurvivalRequest`] is what a caller asks the planner for: a city, a
//! budget, a goal and a number of days. Requests are validated when built,
//! so nothing downstream has to re-check them.

use serde::{Deserialize, Serialize};

use crate::error::{MtaaError, Result};
use crate::types::{Category, Goal};

/// A validated planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalRequest {
    /// City or area, as typed by the caller.
    pub location: String,

    /// Total budget in the local currency. Always positive.
    pub budget: f64,

    /// What the traveller wants to do.
    pub goal: Goal,

    /// Number of days to plan. Always at least one.
    pub duration_days: u32,
}

/// Builder for creating requests with a fluent API.
#[derive(Debug, Default)]
pub struct SurvivalRequestBuilder {
    location: Option<String>,
    budget: Option<f64>,
    goal: Goal,
    duration_days: Option<i64>,
}

impl SurvivalRequestBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the location.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the total budget.
    pub fn budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Set the goal.
    pub fn goal(mut self, goal: Goal) -> Self {
        self.goal = goal;
        self
    }

    /// Set the duration. Signed so that bad input reaches validation.
    pub fn duration_days(mut self, days: i64) -> Self {
        self.duration_days = Some(days);
        self
    }

    /// Build and validate the request.
    pub fn build(self) -> Result<SurvivalRequest> {
        let location = self
            .location
            .ok_or_else(|| MtaaError::validation("location is required"))?;
        if location.trim().is_empty() {
            return Err(MtaaError::validation("location cannot be empty"));
        }

        let budget = self
            .budget
            .ok_or_else(|| MtaaError::validation("budget is required"))?;
        if !budget.is_finite() || budget <= 0.0 {
            return Err(MtaaError::validation(format!(
                "budget must be positive, got {}",
                budget
            )));
        }

        let days = self.duration_days.unwrap_or(7);
        let duration_days = validate_duration(days)?;

        Ok(SurvivalRequest {
            location,
            budget,
            goal: self.goal,
            duration_days,
        })
    }
}

impl SurvivalRequest {
    /// Create a new builder.
    pub fn builder() -> SurvivalRequestBuilder {
        SurvivalRequestBuilder::new()
    }

    /// Budget available per day.
    pub fn daily_budget(&self) -> f64 {
        self.budget / f64::from(self.duration_days)
    }
}

/// Longest stay a plan can cover.
pub const MAX_DURATION_DAYS: u32 = 365;

/// Reject durations outside `1..=MAX_DURATION_DAYS`, returning the duration
/// as a day count.
pub fn validate_duration(days: i64) -> Result<u32> {
    if days <= 0 {
        return Err(MtaaError::validation(format!(
            "duration must be at least one day, got {}",
            days
        )));
    }
    match u32::try_from(days) {
        Ok(days) if days <= MAX_DURATION_DAYS => Ok(days),
        _ => Err(MtaaError::validation(format!(
            "duration of {} days exceeds the {} day limit",
            days, MAX_DURATION_DAYS
        ))),
    }
}

/// Normalize a location for use in keys: trimmed, lowercased, whitespace
/// runs collapsed to a single underscore.
pub fn normalize_location(location: &str) -> String {
    location
        .split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Cache key for a category fetch at a location.
pub fn category_key(category: Category, location: &str) -> String {
    format!("{}_{}", category.slug(), normalize_location(location))
}
