//! Budget analyzer: splits a total budget across categories.
//!
//! Each category has a target share of the budget. A category receives the
//! smaller of its target and its demand (the cost of its cheapest basket of
//! items). Budget left over by categories that need less than their target
//! is then shared among categories that need more, proportionally to how
//! much they are short, for a bounded number of passes.
//!
//! Allocations are whole currency units; fractions are discarded, so the
//! allocated total never exceeds the budget.

use std::collections::BTreeMap;

use mtaa_core::{AllocationStatus, BudgetAllocation, Category, Item, MtaaError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the budget analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Target fraction of the total budget per category. Missing categories
    /// get a target of zero.
    pub targets: BTreeMap<Category, f64>,

    /// How far (as a fraction of target) demand may exceed the target
    /// before a category is flagged `Warning`.
    pub warning_margin: f64,

    /// Number of surplus redistribution passes. Zero disables redistribution.
    pub redistribution_passes: u32,

    /// Number of cheapest items that make up a category's demand.
    pub basket_size: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            targets: BTreeMap::from([
                (Category::Housing, 0.40),
                (Category::Food, 0.30),
                (Category::Transport, 0.15),
                (Category::Entertainment, 0.15),
            ]),
            warning_margin: 0.10,
            redistribution_passes: 1,
            basket_size: 1,
        }
    }
}

impl BudgetConfig {
    /// Target fraction for a category.
    pub fn target(&self, category: Category) -> f64 {
        self.targets.get(&category).copied().unwrap_or(0.0)
    }

    /// Check that the targets describe a share of one budget.
    pub fn validate(&self) -> Result<()> {
        for (category, fraction) in &self.targets {
            if !fraction.is_finite() || !(0.0..=1.0).contains(fraction) {
                return Err(MtaaError::Config(format!(
                    "target for {} must be within [0, 1], got {}",
                    category, fraction
                )));
            }
        }

        let total: f64 = self.targets.values().sum();
        if total > 1.0 + 1e-9 {
            return Err(MtaaError::Config(format!(
                "budget targets must sum to at most 1.0, got {}",
                total
            )));
        }

        if !self.warning_margin.is_finite() || self.warning_margin < 0.0 {
            return Err(MtaaError::Config(format!(
                "warning margin must be non-negative, got {}",
                self.warning_margin
            )));
        }

        if self.basket_size == 0 {
            return Err(MtaaError::Config("basket size must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// Working state for one category during allocation.
#[derive(Debug)]
struct Line {
    category: Category,
    target: f64,
    demand: f64,
    allocated: f64,
    /// Any feasible item with a positive cost.
    has_paid_item: bool,
}

impl Line {
    fn unmet(&self) -> f64 {
        (self.demand - self.allocated).max(0.0)
    }
}

/// Splits a total budget across categories.
#[derive(Debug, Clone, Default)]
pub struct BudgetAnalyzer {
    config: BudgetConfig,
}

impl BudgetAnalyzer {
    /// Create an analyzer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with a custom configuration.
    pub fn with_config(config: BudgetConfig) -> Self {
        Self { config }
    }

    /// Get the analyzer configuration.
    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Cost of the `basket_size` cheapest feasible items, ties broken by
    /// fetch order.
    pub fn demand(&self, items: &[Item]) -> f64 {
        let mut costs: Vec<(f64, usize)> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_feasible())
            .map(|(index, item)| (item.cost, index))
            .collect();
        costs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        costs
            .iter()
            .take(self.config.basket_size)
            .map(|(cost, _)| cost)
            .sum()
    }

    /// Allocate `total_budget` across all categories, in canonical order.
    pub fn analyze(
        &self,
        items_by_category: &BTreeMap<Category, Vec<Item>>,
        total_budget: f64,
    ) -> Result<Vec<BudgetAllocation>> {
        if !total_budget.is_finite() || total_budget < 0.0 {
            return Err(MtaaError::validation(format!(
                "total budget must be a non-negative amount, got {}",
                total_budget
            )));
        }
        self.config.validate()?;

        let mut lines: Vec<Line> = Category::ALL
            .iter()
            .map(|&category| {
                let target = (self.config.target(category) * total_budget).floor();
                let items = items_by_category
                    .get(&category)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let demand = self.demand(items);
                Line {
                    category,
                    target,
                    demand,
                    allocated: target.min(demand).floor(),
                    has_paid_item: items.iter().any(|i| i.is_feasible() && i.cost > 0.0),
                }
            })
            .collect();

        let mut surplus: f64 = lines.iter().map(|l| l.target - l.allocated).sum();
        self.redistribute(&mut lines, &mut surplus);

        let mut allocated_total: f64 = lines.iter().map(|l| l.allocated).sum();
        if allocated_total > total_budget {
            // Whole-unit targets can round above a fractional budget's floor;
            // take the excess back from the largest allocation.
            let excess = allocated_total - total_budget.floor();
            if let Some(largest) = lines
                .iter_mut()
                .max_by(|a, b| a.allocated.total_cmp(&b.allocated))
            {
                largest.allocated = (largest.allocated - excess).max(0.0);
            }
            allocated_total = lines.iter().map(|l| l.allocated).sum();
        }

        let unallocated = (total_budget - allocated_total).max(0.0);
        debug!(
            "Allocated {} of {} across {} categories ({} unallocated)",
            allocated_total,
            total_budget,
            lines.len(),
            unallocated
        );

        Ok(lines
            .into_iter()
            .map(|line| {
                let status = self.status(&line, total_budget, unallocated);
                BudgetAllocation {
                    category: line.category,
                    allocated_amount: line.allocated,
                    percentage_of_total: if total_budget > 0.0 {
                        line.allocated / total_budget
                    } else {
                        0.0
                    },
                    status,
                    target_amount: line.target,
                    demand: line.demand,
                }
            })
            .collect())
    }

    /// Share surplus among categories with unmet demand.
    fn redistribute(&self, lines: &mut [Line], surplus: &mut f64) {
        for pass in 0..self.config.redistribution_passes {
            let unmet_total: f64 = lines.iter().map(Line::unmet).sum();
            if *surplus < 1.0 || unmet_total <= 0.0 {
                break;
            }

            let mut given = 0.0;
            for line in lines.iter_mut() {
                let unmet = line.unmet();
                if unmet <= 0.0 {
                    continue;
                }
                let share = (*surplus * unmet / unmet_total).min(unmet).floor();
                line.allocated += share;
                given += share;
            }

            debug!("Redistribution pass {} moved {} of {}", pass + 1, given, surplus);
            *surplus -= given;
        }
    }

    fn status(&self, line: &Line, total_budget: f64, unallocated: f64) -> AllocationStatus {
        let capacity = line.allocated + unallocated;
        if total_budget == 0.0 && line.has_paid_item {
            // Nothing that costs money is affordable, free picks or not.
            AllocationStatus::Danger
        } else if line.demand > capacity {
            AllocationStatus::Danger
        } else if line.demand > line.target * (1.0 + self.config.warning_margin) {
            AllocationStatus::Warning
        } else {
            AllocationStatus::Ok
        }
    }
}

/// Human-readable risk flags for allocations that are not `Ok`.
pub fn risk_flags(allocations: &[BudgetAllocation]) -> Vec<String> {
    allocations
        .iter()
        .filter_map(|allocation| match allocation.status {
            AllocationStatus::Ok => None,
            AllocationStatus::Warning => Some(format!(
                "{}: cheapest option ({:.0}) is above its target ({:.0})",
                allocation.category, allocation.demand, allocation.target_amount
            )),
            AllocationStatus::Danger => Some(format!(
                "{}: cheapest option ({:.0}) exceeds what the budget can cover ({:.0} short)",
                allocation.category,
                allocation.demand,
                allocation.shortfall()
            )),
        })
        .collect()
}
