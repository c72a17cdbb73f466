//! Items produced by category fetchers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Category;

/// A single listing (a rental, a restaurant, a fare, a venue).
///
/// Fetchers construct items; nothing downstream mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// The category this item belongs to.
    pub category: Category,

    /// Human-readable name of the listing.
    pub name: String,

    /// Cost in the local currency. Never negative.
    pub cost: f64,

    /// Free-form attributes (area, unit, source URL, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Item {
    /// Create an item with no attributes.
    pub fn new(category: Category, name: impl Into<String>, cost: f64) -> Self {
        Self {
            category,
            name: name.into(),
            cost,
            attributes: BTreeMap::new(),
        }
    }

    /// Attach an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// True if the cost is a usable amount (finite and not negative).
    pub fn is_feasible(&self) -> bool {
        self.cost.is_finite() && self.cost >= 0.0
    }
}
