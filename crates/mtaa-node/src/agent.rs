//! Survival agent: the combined entry point for one request.
//!
//! The agent holds a validated [`SurvivalRequest`] and exposes per-category
//! accessors plus [`SurvivalAgent::run_all`], which fetches every category,
//! allocates the budget and builds the itinerary in one go.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use mtaa_cache::{get_typed, set_typed, CacheStore};
use mtaa_core::{
    normalize_location, BudgetAllocation, Category, Goal, Item, ItineraryDay, Result,
    SurvivalRequest, TaskResult,
};
use mtaa_planner::{risk_flags, BudgetAnalyzer, ItineraryGenerator, ItineraryParams};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::orchestrator::TaskOrchestrator;
use crate::tips::{savings_tips, survival_tips, tips_key, BudgetFeasibility};

/// How long generated tips stay cached.
pub const TIPS_TTL: Duration = Duration::from_secs(24 * 3600);

/// How long a generated itinerary stays cached.
pub const ITINERARY_TTL: Duration = Duration::from_secs(12 * 3600);

/// Cache key for the itinerary of a request.
pub fn itinerary_key(location: &str, budget: f64, goal: Goal, duration_days: u32) -> String {
    format!(
        "itinerary_{}_{:.0}_{}_{}",
        normalize_location(location),
        budget,
        goal.to_string().to_lowercase(),
        duration_days
    )
}

/// Everything a full run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurvivalReport {
    /// Unique run ID.
    pub id: Uuid,

    /// The request this report answers.
    pub request: SurvivalRequest,

    /// One result per category.
    pub tasks: BTreeMap<Category, TaskResult>,

    /// Budget split across categories.
    pub allocations: Vec<BudgetAllocation>,

    /// Human-readable warnings for over-budget categories.
    pub risk_flags: Vec<String>,

    /// Day-by-day plan.
    pub itinerary: Vec<ItineraryDay>,

    /// Survival tips for the location, budget and goal.
    pub tips: Vec<String>,

    /// Band the total budget falls in.
    pub budget_feasibility: BudgetFeasibility,

    /// Money-saving advice for the location.
    pub savings_tips: Vec<String>,

    /// Wall-clock run time.
    pub execution_ms: u64,

    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
}

impl SurvivalReport {
    /// Results that could not be served.
    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskResult> {
        self.tasks.values().filter(|t| !t.succeeded)
    }
}

/// Plans for one validated request.
#[derive(Clone)]
pub struct SurvivalAgent {
    request: SurvivalRequest,
    orchestrator: TaskOrchestrator,
    analyzer: BudgetAnalyzer,
    itinerary: ItineraryGenerator,
}

impl SurvivalAgent {
    /// Create an agent with the default analyzer and a narration-free
    /// itinerary generator.
    pub fn new(request: SurvivalRequest, orchestrator: TaskOrchestrator) -> Self {
        Self {
            request,
            orchestrator,
            analyzer: BudgetAnalyzer::new(),
            itinerary: ItineraryGenerator::new(),
        }
    }

    /// Use a custom budget analyzer.
    pub fn with_analyzer(mut self, analyzer: BudgetAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Use a custom itinerary generator.
    pub fn with_itinerary(mut self, itinerary: ItineraryGenerator) -> Self {
        self.itinerary = itinerary;
        self
    }

    /// Get the request.
    pub fn request(&self) -> &SurvivalRequest {
        &self.request
    }

    /// Fetch a single category.
    pub async fn category(&self, category: Category) -> TaskResult {
        self.orchestrator
            .fetch_category(category, &self.request.location)
            .await
    }

    pub async fn housing(&self) -> TaskResult {
        self.category(Category::Housing).await
    }

    pub async fn food(&self) -> TaskResult {
        self.category(Category::Food).await
    }

    pub async fn transport(&self) -> TaskResult {
        self.category(Category::Transport).await
    }

    pub async fn entertainment(&self) -> TaskResult {
        self.category(Category::Entertainment).await
    }

    /// Fetch every category, allocate the budget and plan the days.
    ///
    /// Category failures are recorded in the report, never returned as
    /// errors.
    pub async fn run_all(&self) -> Result<SurvivalReport> {
        let start = Instant::now();
        let id = Uuid::new_v4();
        let request = &self.request;

        info!(
            "Run {}: {} days in {} on {:.0} ({})",
            id, request.duration_days, request.location, request.budget, request.goal
        );

        let tasks = self.orchestrator.run(&request.location, &Category::ALL).await;

        let items: BTreeMap<Category, Vec<Item>> = tasks
            .iter()
            .filter(|(_, task)| task.succeeded)
            .map(|(category, task)| (*category, task.items.clone()))
            .collect();

        let allocations = self.analyzer.analyze(&items, request.budget)?;
        let flags = risk_flags(&allocations);

        let complete = tasks.values().all(|t| t.succeeded);
        let itinerary = self.itinerary(&items, &allocations, complete).await?;
        let tips = self.survival_tips().await;

        let execution_ms = start.elapsed().as_millis() as u64;
        info!("Run {} finished in {}ms", id, execution_ms);

        Ok(SurvivalReport {
            id,
            request: request.clone(),
            tasks,
            allocations,
            risk_flags: flags,
            itinerary,
            tips,
            budget_feasibility: BudgetFeasibility::assess(request.budget),
            savings_tips: savings_tips(&request.location),
            execution_ms,
            generated_at: Utc::now(),
        })
    }

    /// Day plan for this request, cached for 12 hours.
    ///
    /// Plans built while a category was unavailable are not cached.
    async fn itinerary(
        &self,
        items: &BTreeMap<Category, Vec<Item>>,
        allocations: &[BudgetAllocation],
        cacheable: bool,
    ) -> Result<Vec<ItineraryDay>> {
        let request = &self.request;
        let key = itinerary_key(
            &request.location,
            request.budget,
            request.goal,
            request.duration_days,
        );
        let cache: &dyn CacheStore = self.orchestrator.cache().as_ref();

        if let Some(days) = get_typed::<Vec<ItineraryDay>>(cache, &key).await {
            debug!("Cache hit for {}", key);
            return Ok(days);
        }

        let params = ItineraryParams {
            location: &request.location,
            goal: request.goal,
            duration_days: i64::from(request.duration_days),
            total_budget: request.budget,
        };
        let days = self.itinerary.generate(items, allocations, &params).await?;

        if cacheable {
            if let Err(e) = set_typed(cache, &key, &days, ITINERARY_TTL).await {
                warn!("Could not cache {}: {}", key, e);
            }
        } else {
            debug!("Not caching {}, some categories failed", key);
        }
        Ok(days)
    }

    /// Survival tips for this request, cached for a day.
    pub async fn survival_tips(&self) -> Vec<String> {
        let request = &self.request;
        let key = tips_key(&request.location, request.budget, request.goal);
        let cache: &dyn CacheStore = self.orchestrator.cache().as_ref();

        if let Some(tips) = get_typed::<Vec<String>>(cache, &key).await {
            debug!("Cache hit for {}", key);
            return tips;
        }

        let tips = survival_tips(&request.location, request.budget, request.goal);
        if let Err(e) = set_typed(cache, &key, &tips, TIPS_TTL).await {
            warn!("Could not cache {}: {}", key, e);
        }
        tips
    }
}
