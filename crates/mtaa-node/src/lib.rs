//! # Mtaa Node
//!
//! Task orchestration and the HTTP service for the Mtaa survival planner.
//!
//! - [`TaskOrchestrator`] - Cache-checked, concurrent category fetching
//! - [`SurvivalAgent`] - Per-request entry point producing a [`SurvivalReport`]
//! - [`MtaaConfig`] - TOML configuration
//! - [`api::router`] - HTTP surface

pub mod agent;
pub mod api;
pub mod config;
pub mod fetcher;
pub mod hf;
pub mod orchestrator;
pub mod state;
pub mod tips;

pub use agent::{SurvivalAgent, SurvivalReport};
pub use config::MtaaConfig;
pub use fetcher::{CategoryFetcher, StaticFetcher};
pub use hf::HuggingFaceGenerator;
pub use orchestrator::{FetchPolicy, TaskOrchestrator};
pub use state::AppState;
