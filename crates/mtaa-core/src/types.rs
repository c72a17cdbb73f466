//! Common enumerations used across the Mtaa planner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MtaaError;

/// A partition of the city data the planner aggregates.
///
/// Declaration order is the canonical ordering used for map keys and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Rentals and short-stay accommodation.
    Housing,
    /// Restaurants, markets and street food.
    Food,
    /// Matatu, bus, boda boda and ride-hailing fares.
    Transport,
    /// Parks, venues and other places to unwind.
    Entertainment,
}

impl Category {
    /// All categories in canonical order.
    pub const ALL: [Category; 4] = [
        Category::Housing,
        Category::Food,
        Category::Transport,
        Category::Entertainment,
    ];

    /// Stable lowercase identifier, used in cache keys and URLs.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Housing => "housing",
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Entertainment => "entertainment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = MtaaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "housing" | "rentals" => Ok(Category::Housing),
            "food" => Ok(Category::Food),
            "transport" => Ok(Category::Transport),
            "entertainment" | "chill_spots" => Ok(Category::Entertainment),
            other => Err(MtaaError::validation(format!("unknown category '{}'", other))),
        }
    }
}

/// What the traveller is trying to achieve in the city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    /// Keep costs down; essentials first.
    #[default]
    Survive,
    /// See as much as possible; entertainment first, varied.
    Explore,
    /// Settle in; housing and transport links first.
    Relocate,
}

impl Goal {
    /// Category selection priority for this goal, highest first.
    pub fn priority(&self) -> [Category; 4] {
        match self {
            Goal::Survive => [
                Category::Housing,
                Category::Food,
                Category::Transport,
                Category::Entertainment,
            ],
            Goal::Explore => [
                Category::Entertainment,
                Category::Food,
                Category::Transport,
                Category::Housing,
            ],
            Goal::Relocate => [
                Category::Housing,
                Category::Transport,
                Category::Food,
                Category::Entertainment,
            ],
        }
    }

    /// Whether picks in `category` should avoid repeating earlier days.
    pub fn prefers_variety(&self, category: Category) -> bool {
        matches!((self, category), (Goal::Explore, Category::Entertainment))
    }

    /// Short description fed into narrative prompts.
    pub fn preferences(&self) -> &'static str {
        match self {
            Goal::Survive => "budget-friendly, essential services, safe areas, practical",
            Goal::Explore => "cultural sites, entertainment, local experiences, variety",
            Goal::Relocate => "residential areas, long-term amenities, practical setup, community",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Goal::Survive => "Survive",
            Goal::Explore => "Explore",
            Goal::Relocate => "Relocate",
        };
        f.write_str(name)
    }
}

impl FromStr for Goal {
    type Err = MtaaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "survive" => Ok(Goal::Survive),
            "explore" => Ok(Goal::Explore),
            "relocate" => Ok(Goal::Relocate),
            other => Err(MtaaError::validation(format!("unknown goal '{}'", other))),
        }
    }
}

/// Budget health of a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Ok,
    /// Demand exceeds the category target by more than the configured margin.
    Warning,
    /// Demand exceeds everything the budget can still give this category.
    Danger,
}

/// Where the items of a task result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Fetched from the category fetcher during this run.
    Fresh,
    /// Served from an unexpired cache entry.
    Cache,
    /// Served from an expired cache entry after the fetch failed.
    Stale,
    /// Nothing usable was available.
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("Housing".parse::<Category>().unwrap(), Category::Housing);
        assert_eq!(" food ".parse::<Category>().unwrap(), Category::Food);
        assert_eq!("chill_spots".parse::<Category>().unwrap(), Category::Entertainment);
        assert!("groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_goal_parse() {
        assert_eq!("Survive".parse::<Goal>().unwrap(), Goal::Survive);
        assert_eq!("EXPLORE".parse::<Goal>().unwrap(), Goal::Explore);
        assert!(matches!(
            "party".parse::<Goal>(),
            Err(MtaaError::Validation { .. })
        ));
    }

    #[test]
    fn test_goal_priority_covers_all_categories() {
        for goal in [Goal::Survive, Goal::Explore, Goal::Relocate] {
            let mut order = goal.priority().to_vec();
            order.sort();
            assert_eq!(order, Category::ALL.to_vec());
        }
        assert_eq!(Goal::Explore.priority()[0], Category::Entertainment);
    }
}
