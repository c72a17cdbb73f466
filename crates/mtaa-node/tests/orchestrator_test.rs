mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mtaa_cache::{CacheStore, DiskCacheStore};
use mtaa_core::{category_key, Category, Item, Result, ResultSource};
use mtaa_node::{CategoryFetcher, FetchPolicy};

use common::{all_ok, manual_clock, memory_cache, orchestrator, ScriptedFetcher};

struct Panicking;

#[async_trait]
impl CategoryFetcher for Panicking {
    async fn fetch(&self, _location: &str) -> Result<Vec<Item>> {
        panic!("malformed upstream payload");
    }
}

#[tokio::test]
async fn test_panicking_fetcher_only_fails_its_category() {
    let clock = manual_clock();
    let orch = orchestrator(memory_cache(clock.clone()), clock, all_ok())
        .with_fetcher(Category::Food, Arc::new(Panicking));

    let results = orch.run("Nairobi", &Category::ALL).await;

    assert_eq!(results.len(), 4);
    let food = &results[&Category::Food];
    assert!(!food.succeeded);
    assert_eq!(food.source, ResultSource::None);
    assert!(food.error.as_deref().unwrap_or_default().contains("task aborted"));

    for category in [Category::Housing, Category::Transport, Category::Entertainment] {
        assert!(results[&category].succeeded, "{} should succeed", category);
    }
}

#[tokio::test]
async fn test_partial_failure_keeps_other_categories() {
    let clock = manual_clock();
    let mut fetchers = all_ok();
    fetchers[1] = (Category::Food, ScriptedFetcher::failing(Category::Food));
    let orch = orchestrator(memory_cache(clock.clone()), clock, fetchers);

    let results = orch.run("Nairobi", &Category::ALL).await;

    assert_eq!(results.len(), 4);
    assert_eq!(results.values().filter(|r| r.succeeded).count(), 3);

    let food = &results[&Category::Food];
    assert!(!food.succeeded);
    assert!(food.items.is_empty());
    assert!(!food.error.as_deref().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_cache_hit_skips_fetcher() {
    let clock = manual_clock();
    let housing = ScriptedFetcher::ok(Category::Housing, &[9_000.0]);
    let orch = orchestrator(
        memory_cache(clock.clone()),
        clock.clone(),
        vec![(Category::Housing, housing.clone())],
    );

    let first = orch.run("Nairobi", &[Category::Housing]).await;
    clock.advance(Duration::from_secs(3600));
    let second = orch.run("Nairobi", &[Category::Housing]).await;

    assert_eq!(housing.calls(), 1);
    assert_eq!(second[&Category::Housing].source, ResultSource::Cache);
    assert_eq!(second[&Category::Housing].items, first[&Category::Housing].items);
    assert_eq!(
        second[&Category::Housing].fetched_at,
        first[&Category::Housing].fetched_at
    );
}

#[tokio::test]
async fn test_expired_entry_triggers_refetch() {
    let clock = manual_clock();
    let food = ScriptedFetcher::ok(Category::Food, &[200.0]);
    let orch = orchestrator(
        memory_cache(clock.clone()),
        clock.clone(),
        vec![(Category::Food, food.clone())],
    );

    orch.fetch_category(Category::Food, "Kisumu").await;
    clock.advance(orch.policy().ttl(Category::Food));
    let result = orch.fetch_category(Category::Food, "Kisumu").await;

    assert_eq!(food.calls(), 2);
    assert_eq!(result.source, ResultSource::Fresh);
}

#[tokio::test]
async fn test_ttl_per_category() {
    let clock = manual_clock();
    let food = ScriptedFetcher::ok(Category::Food, &[200.0]);
    let transport = ScriptedFetcher::ok(Category::Transport, &[50.0]);
    let orch = orchestrator(
        memory_cache(clock.clone()),
        clock.clone(),
        vec![
            (Category::Food, food.clone()),
            (Category::Transport, transport.clone()),
        ],
    );

    orch.run("Eldoret", &[Category::Food, Category::Transport]).await;
    clock.advance(Duration::from_secs(13 * 3600));
    let results = orch.run("Eldoret", &[Category::Food, Category::Transport]).await;

    assert_eq!(results[&Category::Food].source, ResultSource::Fresh);
    assert_eq!(results[&Category::Transport].source, ResultSource::Cache);
    assert_eq!(food.calls(), 2);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_stale_entry_served_when_fetch_fails() {
    let clock = manual_clock();
    let food = ScriptedFetcher::ok(Category::Food, &[200.0, 300.0]);
    let orch = orchestrator(
        memory_cache(clock.clone()),
        clock.clone(),
        vec![(Category::Food, food.clone())],
    );

    let fresh = orch.fetch_category(Category::Food, "Mombasa").await;
    clock.advance(Duration::from_secs(2 * 24 * 3600));
    food.set_failing(true);

    let stale = orch.fetch_category(Category::Food, "Mombasa").await;

    assert!(stale.succeeded);
    assert!(stale.stale);
    assert_eq!(stale.source, ResultSource::Stale);
    assert_eq!(stale.items, fresh.items);
    assert_eq!(stale.fetched_at, fresh.fetched_at);
}

#[tokio::test]
async fn test_stale_fallback_can_be_disabled() {
    let clock = manual_clock();
    let food = ScriptedFetcher::ok(Category::Food, &[200.0]);
    let orch = orchestrator(
        memory_cache(clock.clone()),
        clock.clone(),
        vec![(Category::Food, food.clone())],
    )
    .with_policy(FetchPolicy {
        serve_stale: false,
        ..FetchPolicy::default()
    });

    orch.fetch_category(Category::Food, "Mombasa").await;
    clock.advance(Duration::from_secs(2 * 24 * 3600));
    food.set_failing(true);

    let result = orch.fetch_category(Category::Food, "Mombasa").await;
    assert!(!result.succeeded);
    assert_eq!(result.source, ResultSource::None);
}

#[tokio::test]
async fn test_timeout_is_a_failure() {
    let clock = manual_clock();
    let slow = ScriptedFetcher::slow(Category::Transport, &[50.0], Duration::from_secs(5));
    let orch = orchestrator(
        memory_cache(clock.clone()),
        clock,
        vec![
            (Category::Transport, slow),
            (Category::Food, ScriptedFetcher::ok(Category::Food, &[100.0])),
        ],
    )
    .with_policy(FetchPolicy {
        timeout: Duration::from_millis(50),
        ..FetchPolicy::default()
    });

    let start = Instant::now();
    let results = orch.run("Nairobi", &[Category::Transport, Category::Food]).await;

    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(results[&Category::Food].succeeded);
    let transport = &results[&Category::Transport];
    assert!(!transport.succeeded);
    assert!(transport.error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_fetches_run_concurrently() {
    let clock = manual_clock();
    let delay = Duration::from_millis(300);
    let fetchers = Category::ALL
        .iter()
        .map(|&c| (c, ScriptedFetcher::slow(c, &[10.0], delay)))
        .collect();
    let orch = orchestrator(memory_cache(clock.clone()), clock, fetchers);

    let start = Instant::now();
    let results = orch.run("Nairobi", &Category::ALL).await;

    assert!(results.values().all(|r| r.succeeded));
    assert!(start.elapsed() < delay * 3);
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let clock = manual_clock();
    let mut fetchers = all_ok();
    fetchers[3] = (
        Category::Entertainment,
        ScriptedFetcher::failing(Category::Entertainment),
    );

    let first = orchestrator(memory_cache(clock.clone()), clock.clone(), fetchers.clone())
        .run("Nairobi", &Category::ALL)
        .await;
    let second = orchestrator(memory_cache(clock.clone()), clock, fetchers)
        .run("Nairobi", &Category::ALL)
        .await;

    assert_eq!(first, second);
    assert_eq!(
        first.keys().copied().collect::<Vec<_>>(),
        Category::ALL.to_vec()
    );
}

#[tokio::test]
async fn test_disk_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = manual_clock();
    let housing = ScriptedFetcher::ok(Category::Housing, &[15_000.0]);

    {
        let cache: Arc<dyn CacheStore> = Arc::new(
            DiskCacheStore::open_with_clock(dir.path().join("cache"), clock.clone())
                .await
                .unwrap(),
        );
        let orch = orchestrator(cache, clock.clone(), vec![(Category::Housing, housing.clone())]);
        orch.fetch_category(Category::Housing, "Nairobi").await;
    }

    let cache: Arc<dyn CacheStore> = Arc::new(
        DiskCacheStore::open_with_clock(dir.path().join("cache"), clock.clone())
            .await
            .unwrap(),
    );
    assert!(cache.get(&category_key(Category::Housing, "nairobi")).await.is_some());

    let orch = orchestrator(cache, clock, vec![(Category::Housing, housing.clone())]);
    let result = orch.fetch_category(Category::Housing, "Nairobi").await;

    assert_eq!(result.source, ResultSource::Cache);
    assert_eq!(housing.calls(), 1);
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let clock = manual_clock();
    let food = ScriptedFetcher::ok(Category::Food, &[200.0]);
    let orch = orchestrator(
        memory_cache(clock.clone()),
        clock,
        vec![(Category::Food, food.clone())],
    );

    orch.fetch_category(Category::Food, "Nairobi").await;
    orch.invalidate(Category::Food, "Nairobi").await.unwrap();
    let result = orch.fetch_category(Category::Food, "Nairobi").await;

    assert_eq!(result.source, ResultSource::Fresh);
    assert_eq!(food.calls(), 2);
}
