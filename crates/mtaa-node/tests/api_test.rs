mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use mtaa_cache::{CacheStats, CacheStore, Clock};
use mtaa_core::{Category, ResultSource, TaskResult};
use mtaa_node::{api, AppState, MtaaConfig, SurvivalReport};
use serde_json::json;

use common::{all_ok, manual_clock, memory_cache, orchestrator, ScriptedFetcher};

fn server_with(fetchers: Vec<(Category, Arc<ScriptedFetcher>)>) -> TestServer {
    let clock = manual_clock();
    let orch = orchestrator(memory_cache(clock.clone()), clock, fetchers);
    TestServer::new(api::router(AppState::new(orch))).unwrap()
}

#[tokio::test]
async fn test_health() {
    let server = server_with(all_ok());
    let response = server.get("/health").await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cache_entries"], 0);
    assert_eq!(body["expired_entries"], 0);
}

#[tokio::test]
async fn test_health_reports_cache_contents() {
    let clock = manual_clock();
    let orch = orchestrator(memory_cache(clock.clone()), clock.clone(), all_ok());
    let server = TestServer::new(api::router(AppState::new(orch))).unwrap();

    server
        .get("/api/v1/categories/food")
        .add_query_param("location", "Nairobi")
        .await
        .assert_status_ok();
    let body = server.get("/health").await.json::<serde_json::Value>();
    assert_eq!(body["cache_entries"], 1);
    assert_eq!(body["expired_entries"], 0);

    clock.advance(Duration::from_secs(13 * 3600));
    let body = server.get("/health").await.json::<serde_json::Value>();
    assert_eq!(body["cache_entries"], 1);
    assert_eq!(body["expired_entries"], 1);
}

#[tokio::test]
async fn test_plan() {
    let server = server_with(all_ok());

    let response = server
        .post("/api/v1/plan")
        .json(&json!({
            "location": "Nairobi",
            "budget": 50000,
            "goal": "explore",
            "duration_days": 2
        }))
        .await;

    response.assert_status_ok();
    let report: SurvivalReport = response.json();
    assert_eq!(report.tasks.len(), 4);
    assert_eq!(report.itinerary.len(), 2);
    assert_eq!(report.allocations.len(), 4);
    assert_eq!(report.request.duration_days, 2);
}

#[tokio::test]
async fn test_plan_rejects_bad_input_before_fetching() {
    let housing = ScriptedFetcher::ok(Category::Housing, &[12_000.0]);
    let server = server_with(vec![(Category::Housing, housing.clone())]);

    for body in [
        json!({"location": "Nairobi", "budget": 0, "duration_days": 3}),
        json!({"location": "Nairobi", "budget": 50000, "duration_days": 0}),
        json!({"location": "Nairobi", "budget": 50000, "duration_days": 100000000}),
        json!({"location": "Nairobi", "budget": 50000, "goal": "party"}),
        json!({"location": "  ", "budget": 50000}),
    ] {
        let response = server.post("/api/v1/plan").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    assert_eq!(housing.calls(), 0);
}

#[tokio::test]
async fn test_category_lookup() {
    let server = server_with(all_ok());

    let first: TaskResult = server
        .get("/api/v1/categories/food")
        .add_query_param("location", "Kisumu")
        .await
        .json();
    let second: TaskResult = server
        .get("/api/v1/categories/food")
        .add_query_param("location", "kisumu")
        .await
        .json();

    assert_eq!(first.source, ResultSource::Fresh);
    assert_eq!(second.source, ResultSource::Cache);

    let response = server
        .get("/api/v1/categories/nightlife")
        .add_query_param("location", "Kisumu")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cache_endpoints() {
    let server = server_with(all_ok());

    server
        .get("/api/v1/categories/housing")
        .add_query_param("location", "Nairobi")
        .await
        .assert_status_ok();

    let stats: CacheStats = server.get("/api/v1/cache/stats").await.json();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.entries[0].key, "housing_nairobi");

    let purged = server.post("/api/v1/cache/purge").await.json::<serde_json::Value>();
    assert_eq!(purged["removed"], 0);

    let response = server
        .delete("/api/v1/cache/housing")
        .add_query_param("location", "Nairobi")
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let stats: CacheStats = server.get("/api/v1/cache/stats").await.json();
    assert_eq!(stats.total_entries, 0);
}

#[tokio::test]
async fn test_state_from_memory_config() {
    let config = MtaaConfig::parse("[cache]\nbackend = \"memory\"").unwrap();
    let state = AppState::from_config(&config).await.unwrap();
    let server = TestServer::new(api::router(state)).unwrap();

    let result: TaskResult = server
        .get("/api/v1/categories/transport")
        .add_query_param("location", "Mombasa")
        .await
        .json();

    assert!(result.succeeded);
    assert_eq!(result.items.len(), 5);
}

#[tokio::test]
async fn test_state_shares_one_clock() {
    let clock = manual_clock();
    let config = MtaaConfig::parse("[cache]\nbackend = \"memory\"").unwrap();
    let state = AppState::from_config_with_clock(&config, clock.clone()).await.unwrap();
    let server = TestServer::new(api::router(state.clone())).unwrap();

    let result: TaskResult = server
        .get("/api/v1/categories/housing")
        .add_query_param("location", "Nairobi")
        .await
        .json();
    let entry = state.cache().get("housing_nairobi").await.unwrap();

    assert_eq!(result.fetched_at, clock.now());
    assert_eq!(entry.created_at, clock.now());

    // Housing lives for a day on both the cache and the result side.
    clock.advance(Duration::from_secs(24 * 3600 + 1));
    let stats: CacheStats = server.get("/api/v1/cache/stats").await.json();
    assert_eq!(stats.expired_entries, 1);
}
