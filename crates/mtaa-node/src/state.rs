//! Application state.

use std::sync::Arc;
use std::time::Duration;

use mtaa_cache::{CacheStore, Clock, DiskCacheStore, InMemoryCacheStore, SystemClock};
use mtaa_core::{Category, Result, SurvivalRequest};
use mtaa_planner::{BudgetAnalyzer, ItineraryGenerator, Narrator};
use tracing::{info, warn};

use crate::agent::SurvivalAgent;
use crate::config::{CacheBackend, MtaaConfig};
use crate::fetcher::StaticFetcher;
use crate::hf::HuggingFaceGenerator;
use crate::orchestrator::TaskOrchestrator;

/// Deadline for one narrative generation call.
const NARRATIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Cache-backed category fetching.
    pub orchestrator: TaskOrchestrator,

    /// Budget split settings.
    pub analyzer: BudgetAnalyzer,

    /// Itinerary builder, possibly with narration.
    pub itinerary: ItineraryGenerator,
}

impl AppState {
    /// Create state around an orchestrator, with default planning.
    pub fn new(orchestrator: TaskOrchestrator) -> Self {
        Self {
            orchestrator,
            analyzer: BudgetAnalyzer::new(),
            itinerary: ItineraryGenerator::new(),
        }
    }

    /// Build the state described by a configuration.
    pub async fn from_config(config: &MtaaConfig) -> Result<Self> {
        Self::from_config_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Build the state described by a configuration, with the cache and the
    /// orchestrator reading time from one clock.
    pub async fn from_config_with_clock(config: &MtaaConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let cache: Arc<dyn CacheStore> = match config.cache.backend {
            CacheBackend::Disk => {
                info!("Using disk cache at {}", config.cache.dir.display());
                Arc::new(DiskCacheStore::open_with_clock(config.cache.dir.clone(), clock.clone()).await?)
            }
            CacheBackend::Memory => {
                info!("Using in-memory cache");
                Arc::new(InMemoryCacheStore::with_clock(clock.clone()))
            }
        };

        let orchestrator = Category::ALL.iter().fold(
            TaskOrchestrator::new(cache)
                .with_policy(config.fetch.policy())
                .with_clock(clock),
            |orch, &category| {
                orch.with_fetcher(category, Arc::new(StaticFetcher::for_category(category)))
            },
        );

        let itinerary = if config.narrative.enabled {
            let token = std::env::var(&config.narrative.api_token_env).ok();
            if token.is_none() {
                warn!(
                    "{} is not set, calling {} without a token",
                    config.narrative.api_token_env, config.narrative.endpoint
                );
            }
            let generator =
                HuggingFaceGenerator::new(&config.narrative.endpoint, token, NARRATIVE_TIMEOUT)?;
            let narrator = Narrator::new(Arc::new(generator), config.narrative.narrator_config());
            ItineraryGenerator::with_narrator(narrator)
        } else {
            ItineraryGenerator::new()
        };

        Ok(Self {
            orchestrator,
            analyzer: BudgetAnalyzer::with_config(config.budget.clone()),
            itinerary,
        })
    }

    /// Agent for a validated request.
    pub fn agent(&self, request: SurvivalRequest) -> SurvivalAgent {
        SurvivalAgent::new(request, self.orchestrator.clone())
            .with_analyzer(self.analyzer.clone())
            .with_itinerary(self.itinerary.clone())
    }

    /// Get the cache store.
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        self.orchestrator.cache()
    }
}
