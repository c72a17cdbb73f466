//! Node configuration, loaded from TOML.
//!
//! Every section is optional; missing values take their defaults. The path
//! comes from `MTAA_CONFIG` when set.

use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mtaa_core::{Category, MtaaError, Result};
use mtaa_planner::{BudgetConfig, NarratorConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::orchestrator::FetchPolicy;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MTAA_CONFIG";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MtaaConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub fetch: FetchConfig,
    pub budget: BudgetConfig,
    pub narrative: NarrativeConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,

    /// Default tracing filter; `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: "info".to_string(),
        }
    }
}

/// Where cache entries live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Disk,
    Memory,
}

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory for the disk backend. Created on open.
    pub dir: PathBuf,
    pub backend: CacheBackend,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            backend: CacheBackend::Disk,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("mtaa")
}

/// Fetch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_ms: u64,
    pub serve_stale: bool,

    /// Cache lifetime per category, in seconds.
    pub ttl_secs: BTreeMap<Category, u64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let policy = FetchPolicy::default();
        Self {
            timeout_ms: policy.timeout.as_millis() as u64,
            serve_stale: policy.serve_stale,
            ttl_secs: policy
                .ttls
                .iter()
                .map(|(category, ttl)| (*category, ttl.as_secs()))
                .collect(),
        }
    }
}

impl FetchConfig {
    /// Orchestrator policy for these settings.
    pub fn policy(&self) -> FetchPolicy {
        FetchPolicy {
            ttls: self
                .ttl_secs
                .iter()
                .map(|(category, secs)| (*category, Duration::from_secs(*secs)))
                .collect(),
            timeout: Duration::from_millis(self.timeout_ms),
            serve_stale: self.serve_stale,
        }
    }
}

/// Narrative generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub enabled: bool,

    /// Base URL; the model id is appended as a path segment.
    pub endpoint: String,
    pub primary_model: String,
    pub fallback_model: String,
    pub max_tokens: u32,

    /// Environment variable holding the API token.
    pub api_token_env: String,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        let narrator = NarratorConfig::default();
        Self {
            enabled: false,
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            primary_model: narrator.primary_model,
            fallback_model: narrator.fallback_model,
            max_tokens: narrator.max_tokens,
            api_token_env: "HF_API_TOKEN".to_string(),
        }
    }
}

impl NarrativeConfig {
    /// Narrator settings for these values.
    pub fn narrator_config(&self) -> NarratorConfig {
        NarratorConfig {
            primary_model: self.primary_model.clone(),
            fallback_model: self.fallback_model.clone(),
            max_tokens: self.max_tokens,
        }
    }
}

impl MtaaConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            MtaaError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&contents)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: MtaaConfig = toml::from_str(contents)
            .map_err(|e| MtaaError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `MTAA_CONFIG`, or use defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        let levels = ["error", "warn", "info", "debug", "trace"];
        if !levels.contains(&self.server.log_level.as_str()) {
            return Err(MtaaError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.server.log_level,
                levels.join(", ")
            )));
        }

        if self.fetch.timeout_ms == 0 {
            return Err(MtaaError::Config("fetch timeout must be positive".to_string()));
        }

        self.budget.validate()?;

        if self.narrative.enabled && self.narrative.max_tokens == 0 {
            return Err(MtaaError::Config("narrative max_tokens must be positive".to_string()));
        }

        Ok(())
    }
}
