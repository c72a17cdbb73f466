//! # Mtaa Core
//!
//! Core domain types for the Mtaa survival planner.
//!
//! This crate provides the shared vocabulary:
//! - [`Item`] - A listing returned by a category fetcher
//! - [`TaskResult`] - Per-category outcome of a data run
//! - [`BudgetAllocation`] / [`ItineraryDay`] - Derived plan outputs
//! - [`SurvivalRequest`] - Validated caller input
//! - [`MtaaError`] - Error taxonomy

pub mod error;
pub mod item;
pub mod outcome;
pub mod request;
pub mod types;

// Re-exports for convenience
pub use error::{MtaaError, Result};
pub use item::Item;
pub use outcome::{BudgetAllocation, ItineraryDay, TaskResult};
pub use request::{
    category_key, normalize_location, validate_duration, SurvivalRequest, SurvivalRequestBuilder,
    MAX_DURATION_DAYS,
};
pub use types::*;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{MtaaError, Result};
    pub use crate::item::Item;
    pub use crate::outcome::{BudgetAllocation, ItineraryDay, TaskResult};
    pub use crate::request::SurvivalRequest;
    pub use crate::types::{AllocationStatus, Category, Goal, ResultSource};
}
