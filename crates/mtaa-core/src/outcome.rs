//! Outputs of a planning run: per-category task results, budget allocations
//! and itinerary days.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::Item;
use crate::types::{AllocationStatus, Category, ResultSource};

/// Outcome of acquiring one category's data during a run.
///
/// Either `succeeded` with items, or failed with no items and an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// The category this result covers.
    pub category: Category,

    /// Items in fetch order.
    pub items: Vec<Item>,

    /// When the items were originally fetched.
    pub fetched_at: DateTime<Utc>,

    /// Whether usable items are present.
    pub succeeded: bool,

    /// Error message when the category could not be served.
    pub error: Option<String>,

    /// Where the items came from.
    pub source: ResultSource,

    /// True if the items come from an expired cache entry.
    pub stale: bool,
}

impl TaskResult {
    /// A successful result.
    pub fn success(
        category: Category,
        items: Vec<Item>,
        fetched_at: DateTime<Utc>,
        source: ResultSource,
    ) -> Self {
        Self {
            category,
            items,
            fetched_at,
            succeeded: true,
            error: None,
            source,
            stale: source == ResultSource::Stale,
        }
    }

    /// A failed result. Failed results never carry items.
    pub fn failure(category: Category, error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            category,
            items: Vec::new(),
            fetched_at: at,
            succeeded: false,
            error: Some(error.into()),
            source: ResultSource::None,
            stale: false,
        }
    }
}

/// Portion of the total budget assigned to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub category: Category,

    /// Amount assigned after redistribution.
    pub allocated_amount: f64,

    /// `allocated_amount / total_budget`, zero when the budget is zero.
    pub percentage_of_total: f64,

    pub status: AllocationStatus,

    /// Configured target share of the budget, as an amount.
    pub target_amount: f64,

    /// Cost of the cheapest basket of items in this category.
    pub demand: f64,
}

impl BudgetAllocation {
    /// Demand left uncovered by the allocation.
    pub fn shortfall(&self) -> f64 {
        (self.demand - self.allocated_amount).max(0.0)
    }
}

/// One day of the generated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    /// 1-based day number.
    pub day_index: u32,

    /// Selected items, at most one per category, in selection order.
    pub activities: Vec<Item>,

    /// Sum of the activity costs.
    pub running_cost: f64,

    /// Human-readable description of the day.
    pub narrative: String,
}

impl ItineraryDay {
    /// Build a day from its selected activities.
    pub fn new(day_index: u32, activities: Vec<Item>) -> Self {
        let running_cost = activities.iter().map(|item| item.cost).sum();
        Self {
            day_index,
            activities,
            running_cost,
            narrative: String::new(),
        }
    }

    /// Attach narrative text, consuming the day.
    pub fn with_narrative(mut self, narrative: impl Into<String>) -> Self {
        self.narrative = narrative.into();
        self
    }

    /// Names of the activities, in order.
    pub fn activity_names(&self) -> Vec<&str> {
        self.activities.iter().map(|item| item.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_has_no_items() {
        let result = TaskResult::failure(Category::Food, "scraper down", Utc::now());
        assert!(!result.succeeded);
        assert!(result.items.is_empty());
        assert_eq!(result.error.as_deref(), Some("scraper down"));
        assert_eq!(result.source, ResultSource::None);
    }

    #[test]
    fn test_stale_flag_follows_source() {
        let items = vec![Item::new(Category::Transport, "Matatu CBD", 50.0)];
        let stale = TaskResult::success(Category::Transport, items.clone(), Utc::now(), ResultSource::Stale);
        assert!(stale.succeeded && stale.stale);

        let fresh = TaskResult::success(Category::Transport, items, Utc::now(), ResultSource::Fresh);
        assert!(!fresh.stale);
    }

    #[test]
    fn test_day_running_cost() {
        let day = ItineraryDay::new(
            1,
            vec![
                Item::new(Category::Housing, "Bedsitter", 12_000.0),
                Item::new(Category::Food, "Kibanda", 150.0),
            ],
        );
        assert_eq!(day.running_cost, 12_150.0);
        assert_eq!(day.activity_names(), vec!["Bedsitter", "Kibanda"]);
    }
}
