//! # Mtaa Planner
//!
//! Budget allocation and day-by-day itinerary generation.
//!
//! - [`BudgetAnalyzer`] splits a total budget across categories
//! - [`ItineraryGenerator`] selects activities under a daily ceiling
//! - [`Narrator`] optionally describes each day through a text model

pub mod budget;
pub mod itinerary;
pub mod narrative;

pub use budget::{risk_flags, BudgetAnalyzer, BudgetConfig};
pub use itinerary::{ItineraryGenerator, ItineraryParams};
pub use narrative::{Narrator, NarratorConfig, TextGenerator};
