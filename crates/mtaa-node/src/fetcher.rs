//! Category fetchers.
//!
//! A fetcher turns a location into a list of items for one category. It
//! makes a single attempt: retries, timeouts and cache fallback belong to
//! the orchestrator.

use async_trait::async_trait;
use mtaa_core::{Category, Item, MtaaError, Result};
use serde_json::json;

/// Source of items for one category.
#[async_trait]
pub trait CategoryFetcher: Send + Sync {
    /// Fetch the listings for `location`.
    async fn fetch(&self, location: &str) -> Result<Vec<Item>>;
}

/// A listing template. `{city}` in the name is replaced by the location.
#[derive(Debug, Clone)]
struct Listing {
    name: &'static str,
    cost: f64,
    unit: &'static str,
}

/// Fetcher serving built-in listings, used when no live source is wired.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    category: Category,
    listings: Vec<Listing>,
}

impl StaticFetcher {
    /// Built-in listings for a category.
    pub fn for_category(category: Category) -> Self {
        let listings = match category {
            Category::Housing => vec![
                listing("Shared room in {city}", 8_000.0, "month"),
                listing("Bedsitter in {city}", 12_000.0, "month"),
                listing("Studio apartment in {city}", 15_000.0, "month"),
                listing("1-bedroom in {city} central", 25_000.0, "month"),
                listing("2-bedroom in {city} suburbs", 35_000.0, "month"),
            ],
            Category::Food => vec![
                listing("Local kibandas, street food in {city}", 150.0, "meal"),
                listing("Kenchic, fast food chicken in {city}", 450.0, "meal"),
                listing("Mama Oliech Restaurant, traditional food in {city}", 700.0, "meal"),
                listing("Java House, coffee and light meals in {city}", 900.0, "meal"),
                listing("Artcaffe, international cuisine in {city}", 1_500.0, "meal"),
            ],
            Category::Transport => vec![
                listing("Matatu fare within {city} CBD", 50.0, "trip"),
                listing("Boda boda short distance in {city}", 100.0, "trip"),
                listing("Bus fare to or from {city} airport", 200.0, "trip"),
                listing("Tuk-tuk in {city}", 300.0, "trip"),
                listing("Uber or Bolt within {city}", 500.0, "trip"),
            ],
            Category::Entertainment => vec![
                listing("Uhuru Park, green space in {city}", 0.0, "visit"),
                listing("Hill viewpoints near {city}", 0.0, "visit"),
                listing("Museums in {city}", 600.0, "visit"),
                listing("Art galleries in {city}", 500.0, "visit"),
                listing("Rooftop bars in {city} CBD", 1_200.0, "visit"),
            ],
        };
        Self { category, listings }
    }
}

fn listing(name: &'static str, cost: f64, unit: &'static str) -> Listing {
    Listing { name, cost, unit }
}

#[async_trait]
impl CategoryFetcher for StaticFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<Item>> {
        let city = location.trim();
        if city.is_empty() {
            return Err(MtaaError::fetch(self.category, "no location given"));
        }

        Ok(self
            .listings
            .iter()
            .map(|l| {
                Item::new(self.category, l.name.replace("{city}", city), l.cost)
                    .with_attribute("location", json!(city))
                    .with_attribute("unit", json!(l.unit))
                    .with_attribute("currency", json!("KES"))
            })
            .collect())
    }
}
