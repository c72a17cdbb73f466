//! Itinerary generator: turns fetched items and allocations into days.
//!
//! Selection is deterministic. Every day gets the same ceiling,
//! `total_budget / duration_days`, and picks at most one item per category
//! in the goal's priority order, taking the cheapest item that still fits
//! under the ceiling (ties go to the earlier-fetched item). Narratives are
//! added afterwards and can never change what was selected.

use std::collections::{BTreeMap, HashSet};

use futures::future::join_all;
use mtaa_core::{
    validate_duration, AllocationStatus, BudgetAllocation, Category, Goal, Item, ItineraryDay,
    MtaaError, Result,
};
use tracing::{debug, info, warn};

use crate::narrative::Narrator;

/// Per-request inputs of the generator.
#[derive(Debug, Clone)]
pub struct ItineraryParams<'a> {
    /// City the plan is for; only used in narrative prompts.
    pub location: &'a str,
    pub goal: Goal,
    /// Number of days. Non-positive values are rejected.
    pub duration_days: i64,
    pub total_budget: f64,
}

/// Builds day-by-day plans.
#[derive(Clone, Default)]
pub struct ItineraryGenerator {
    narrator: Option<Narrator>,
}

impl ItineraryGenerator {
    /// Create a generator without narrative enrichment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator that narrates each day.
    pub fn with_narrator(narrator: Narrator) -> Self {
        Self {
            narrator: Some(narrator),
        }
    }

    /// Select activities and narrate every day.
    pub async fn generate(
        &self,
        items_by_category: &BTreeMap<Category, Vec<Item>>,
        allocations: &[BudgetAllocation],
        params: &ItineraryParams<'_>,
    ) -> Result<Vec<ItineraryDay>> {
        let days = self.select(items_by_category, allocations, params)?;

        let Some(narrator) = &self.narrator else {
            return Ok(days);
        };

        let ceiling = daily_ceiling(params.total_budget, days.len());
        let narrated = join_all(days.into_iter().map(|day| async move {
            let prompt = day_prompt(params, ceiling, &day);
            match narrator.narrate(&prompt).await {
                Ok(text) => day.with_narrative(text),
                Err(e) => {
                    warn!("Narrative for day {} unavailable: {}", day.day_index, e);
                    let text = placeholder(&day);
                    day.with_narrative(text)
                }
            }
        }))
        .await;

        Ok(narrated)
    }

    /// Deterministic activity selection, without narrative enrichment.
    pub fn select(
        &self,
        items_by_category: &BTreeMap<Category, Vec<Item>>,
        allocations: &[BudgetAllocation],
        params: &ItineraryParams<'_>,
    ) -> Result<Vec<ItineraryDay>> {
        let duration = validate_duration(params.duration_days)?;
        if !params.total_budget.is_finite() || params.total_budget < 0.0 {
            return Err(MtaaError::validation(format!(
                "total budget must be a non-negative amount, got {}",
                params.total_budget
            )));
        }

        let ceiling = daily_ceiling(params.total_budget, duration as usize);
        let order = selection_order(params.goal, allocations);
        let mut used: BTreeMap<Category, HashSet<usize>> = BTreeMap::new();

        info!(
            "Planning {} days for goal {} with a daily ceiling of {:.2}",
            duration, params.goal, ceiling
        );

        let days = (1..=duration)
            .map(|day_index| {
                let mut running = 0.0;
                let mut activities = Vec::new();

                for &category in &order {
                    let Some(items) = items_by_category.get(&category) else {
                        continue;
                    };
                    let seen = used.entry(category).or_default();
                    let variety = params.goal.prefers_variety(category);

                    if let Some(index) = pick(items, running, ceiling, variety.then_some(&*seen)) {
                        running += items[index].cost;
                        activities.push(items[index].clone());
                        seen.insert(index);
                    }
                }

                debug!("Day {}: {} activities, cost {:.2}", day_index, activities.len(), running);
                let day = ItineraryDay::new(day_index, activities);
                let text = summary(&day);
                day.with_narrative(text)
            })
            .collect();

        Ok(days)
    }
}

fn daily_ceiling(total_budget: f64, days: usize) -> f64 {
    if days == 0 {
        0.0
    } else {
        total_budget / days as f64
    }
}

/// Goal priority, with categories already in danger moved to the back.
fn selection_order(goal: Goal, allocations: &[BudgetAllocation]) -> Vec<Category> {
    let in_danger = |category: &Category| {
        allocations
            .iter()
            .any(|a| a.category == *category && a.status == AllocationStatus::Danger)
    };

    let (mut order, danger): (Vec<Category>, Vec<Category>) =
        goal.priority().into_iter().partition(|c| !in_danger(c));
    order.extend(danger);
    order
}

/// Index of the cheapest item that fits under the ceiling. With `avoid`,
/// items not yet used are preferred over repeats.
fn pick(items: &[Item], running: f64, ceiling: f64, avoid: Option<&HashSet<usize>>) -> Option<usize> {
    let fitting = || {
        items
            .iter()
            .enumerate()
            .filter(move |(_, item)| item.is_feasible() && running + item.cost <= ceiling)
    };
    let cheapest = |candidates: Vec<(usize, &Item)>| {
        candidates
            .into_iter()
            .min_by(|a, b| a.1.cost.total_cmp(&b.1.cost).then(a.0.cmp(&b.0)))
            .map(|(index, _)| index)
    };

    if let Some(avoid) = avoid {
        let fresh: Vec<_> = fitting().filter(|(index, _)| !avoid.contains(index)).collect();
        if let Some(index) = cheapest(fresh) {
            return Some(index);
        }
    }
    cheapest(fitting().collect())
}

fn summary(day: &ItineraryDay) -> String {
    if day.activities.is_empty() {
        return format!("Day {}: no affordable activities found", day.day_index);
    }
    format!(
        "Day {}: {} (total {:.0})",
        day.day_index,
        day.activity_names().join(", "),
        day.running_cost
    )
}

fn placeholder(day: &ItineraryDay) -> String {
    let names = day.activity_names();
    if names.is_empty() {
        format!("Day {}: narrative unavailable; no planned activities", day.day_index)
    } else {
        format!(
            "Day {}: narrative unavailable; planned activities: {}",
            day.day_index,
            names.join(", ")
        )
    }
}

fn day_prompt(params: &ItineraryParams<'_>, ceiling: f64, day: &ItineraryDay) -> String {
    let activities = day
        .activities
        .iter()
        .map(|item| format!("- {} ({}): {:.0}", item.name, item.category, item.cost))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Describe day {day} of {days} in {city}, Kenya for someone whose goal is to {goal}.\n\
         Preferences: {prefs}\n\
         Daily budget: KES {ceiling:.0}, planned spend: KES {spend:.0}\n\
         Planned activities:\n{activities}\n\n\
         Give practical, culturally relevant advice for the day in a short paragraph.\n\n\
         Day plan:",
        day = day.day_index,
        days = params.duration_days,
        city = params.location,
        goal = params.goal.to_string().to_lowercase(),
        prefs = params.goal.preferences(),
        ceiling = ceiling,
        spend = day.running_cost,
        activities = activities,
    )
}
