//! Fetchers and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mtaa_cache::{CacheStore, InMemoryCacheStore, ManualClock};
use mtaa_core::{Category, Item, MtaaError, Result};
use mtaa_node::{CategoryFetcher, TaskOrchestrator};

/// Returns fixed costs, can be switched to failing, and counts calls.
pub struct ScriptedFetcher {
    category: Category,
    costs: Vec<f64>,
    failing: AtomicBool,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn ok(category: Category, costs: &[f64]) -> Arc<Self> {
        Arc::new(Self {
            category,
            costs: costs.to_vec(),
            failing: AtomicBool::new(false),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(category: Category) -> Arc<Self> {
        let fetcher = Self::ok(category, &[]);
        fetcher.set_failing(true);
        fetcher
    }

    pub fn slow(category: Category, costs: &[f64], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            category,
            costs: costs.to_vec(),
            failing: AtomicBool::new(false),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CategoryFetcher for ScriptedFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<Item>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(MtaaError::fetch(self.category, "connection reset"));
        }
        Ok(self
            .costs
            .iter()
            .enumerate()
            .map(|(i, cost)| Item::new(self.category, format!("{} {} #{}", location, self.category, i), *cost))
            .collect())
    }
}

/// A clock starting at a fixed instant.
pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()))
}

/// In-memory cache sharing `clock`.
pub fn memory_cache(clock: Arc<ManualClock>) -> Arc<dyn CacheStore> {
    Arc::new(InMemoryCacheStore::with_clock(clock))
}

/// Orchestrator with one fetcher per category, all on `clock`.
pub fn orchestrator(
    cache: Arc<dyn CacheStore>,
    clock: Arc<ManualClock>,
    fetchers: Vec<(Category, Arc<ScriptedFetcher>)>,
) -> TaskOrchestrator {
    fetchers.into_iter().fold(
        TaskOrchestrator::new(cache).with_clock(clock),
        |orch, (category, fetcher)| orch.with_fetcher(category, fetcher),
    )
}

/// One working fetcher for every category.
pub fn all_ok() -> Vec<(Category, Arc<ScriptedFetcher>)> {
    vec![
        (Category::Housing, ScriptedFetcher::ok(Category::Housing, &[12_000.0, 18_000.0])),
        (Category::Food, ScriptedFetcher::ok(Category::Food, &[150.0, 450.0])),
        (Category::Transport, ScriptedFetcher::ok(Category::Transport, &[50.0, 100.0])),
        (Category::Entertainment, ScriptedFetcher::ok(Category::Entertainment, &[0.0, 600.0])),
    ]
}
