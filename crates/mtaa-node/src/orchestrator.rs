//! Task orchestrator.
//!
//! Runs one cache-checked fetch per category, concurrently, and turns every
//! outcome into a [`TaskResult`]. A failing category never affects the
//! others and never escapes as an error. Each fetch runs as its own tokio
//! task, so a panicking fetcher becomes a failed result for its category.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use mtaa_cache::{set_typed, CacheEntry, CacheStore, Clock, SystemClock};
use mtaa_core::{category_key, Category, Item, MtaaError, ResultSource, Result, TaskResult};
use tracing::{debug, error, info, warn};

use crate::fetcher::CategoryFetcher;

/// How categories are fetched and cached.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Cache lifetime per category.
    pub ttls: BTreeMap<Category, Duration>,

    /// Deadline for a single fetch.
    pub timeout: Duration,

    /// Serve expired cache entries when a fetch fails.
    pub serve_stale: bool,
}

impl FetchPolicy {
    /// Fallback TTL for categories missing from `ttls`.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

    /// TTL for a category.
    pub fn ttl(&self, category: Category) -> Duration {
        self.ttls.get(&category).copied().unwrap_or(Self::DEFAULT_TTL)
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        let hours = |h: u64| Duration::from_secs(h * 3600);
        Self {
            ttls: BTreeMap::from([
                (Category::Housing, hours(24)),
                (Category::Food, hours(12)),
                (Category::Transport, hours(48)),
                (Category::Entertainment, hours(24)),
            ]),
            timeout: Duration::from_secs(10),
            serve_stale: true,
        }
    }
}

/// Coordinates category fetchers through the cache.
#[derive(Clone)]
pub struct TaskOrchestrator {
    cache: Arc<dyn CacheStore>,
    fetchers: BTreeMap<Category, Arc<dyn CategoryFetcher>>,
    policy: FetchPolicy,
    clock: Arc<dyn Clock>,
}

impl TaskOrchestrator {
    /// Create an orchestrator over a cache store, with no fetchers.
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self {
            cache,
            fetchers: BTreeMap::new(),
            policy: FetchPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Register the fetcher for a category, replacing any previous one.
    pub fn with_fetcher(mut self, category: Category, fetcher: Arc<dyn CategoryFetcher>) -> Self {
        self.fetchers.insert(category, fetcher);
        self
    }

    /// Use a custom fetch policy.
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a custom clock for result timestamps.
    ///
    /// Should be the cache store's clock, or fresh results and cached ones
    /// are stamped from different sources.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get the fetch policy.
    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Get the underlying cache store.
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Fetch every requested category concurrently.
    ///
    /// The returned map has exactly one entry per distinct requested
    /// category, whatever happened to the individual fetches.
    pub async fn run(&self, location: &str, categories: &[Category]) -> BTreeMap<Category, TaskResult> {
        let categories: BTreeSet<Category> = categories.iter().copied().collect();
        let start = Instant::now();
        info!("Running {} category tasks for {}", categories.len(), location);

        let handles = categories.iter().map(|&category| {
            let orchestrator = self.clone();
            let location = location.to_string();
            let handle = tokio::spawn(async move {
                orchestrator.fetch_category(category, &location).await
            });
            async move { (category, handle.await) }
        });

        let results: BTreeMap<Category, TaskResult> = join_all(handles)
            .await
            .into_iter()
            .map(|(category, joined)| {
                let result = joined.unwrap_or_else(|e| {
                    error!("Task for {} in {} aborted: {}", category, location, e);
                    TaskResult::failure(category, format!("task aborted: {}", e), self.clock.now())
                });
                (category, result)
            })
            .collect();

        let failed = results.values().filter(|r| !r.succeeded).count();
        info!(
            "Category tasks for {} finished in {}ms ({} failed)",
            location,
            start.elapsed().as_millis(),
            failed
        );
        results
    }

    /// Serve one category: cache, then fetcher, then stale cache.
    pub async fn fetch_category(&self, category: Category, location: &str) -> TaskResult {
        let key = category_key(category, location);

        if let Some(entry) = self.cache.get(&key).await {
            if let Some(items) = decode_items(&entry) {
                debug!("Cache hit for {}", key);
                return TaskResult::success(category, items, entry.created_at, ResultSource::Cache);
            }
        }
        debug!("Cache miss for {}", key);

        let error = match self.fetch_fresh(category, location).await {
            Ok(items) => {
                let fetched_at = self.clock.now();
                let ttl = self.policy.ttl(category);
                if let Err(e) = set_typed(self.cache.as_ref(), &key, &items, ttl).await {
                    warn!("Could not cache {}: {}", key, e);
                }
                return TaskResult::success(category, items, fetched_at, ResultSource::Fresh);
            }
            Err(e) => e,
        };

        warn!("Fetch for {} failed: {}", key, error);

        if self.policy.serve_stale {
            if let Some(entry) = self.cache.peek(&key).await {
                if let Some(items) = decode_items(&entry) {
                    warn!("Serving stale entry for {} from {}", key, entry.created_at);
                    return TaskResult::success(category, items, entry.created_at, ResultSource::Stale);
                }
            }
        }

        TaskResult::failure(category, error.to_string(), self.clock.now())
    }

    /// Drop the cached data of a category at a location.
    pub async fn invalidate(&self, category: Category, location: &str) -> Result<()> {
        self.cache.invalidate(&category_key(category, location)).await
    }

    async fn fetch_fresh(&self, category: Category, location: &str) -> Result<Vec<Item>> {
        let fetcher = self
            .fetchers
            .get(&category)
            .ok_or_else(|| MtaaError::fetch(category, "no fetcher registered"))?;

        let items = tokio::time::timeout(self.policy.timeout, fetcher.fetch(location))
            .await
            .map_err(|_| MtaaError::Timeout {
                category,
                duration_ms: self.policy.timeout.as_millis() as u64,
            })??;

        validate_items(category, &items)?;
        Ok(items)
    }
}

/// Reject empty responses and items that cannot be planned with.
fn validate_items(category: Category, items: &[Item]) -> Result<()> {
    if items.is_empty() {
        return Err(MtaaError::fetch(category, "empty response"));
    }
    if let Some(item) = items.iter().find(|i| i.category != category) {
        return Err(MtaaError::fetch(
            category,
            format!("item {:?} belongs to {}", item.name, item.category),
        ));
    }
    if let Some(item) = items.iter().find(|i| !i.is_feasible()) {
        return Err(MtaaError::fetch(
            category,
            format!("item {:?} has invalid cost {}", item.name, item.cost),
        ));
    }
    Ok(())
}

fn decode_items(entry: &CacheEntry) -> Option<Vec<Item>> {
    match serde_json::from_value::<Vec<Item>>(entry.value.clone()) {
        Ok(items) if !items.is_empty() => Some(items),
        Ok(_) => None,
        Err(e) => {
            warn!("Cache entry {} is not an item list: {}", entry.key, e);
            None
        }
    }
}
