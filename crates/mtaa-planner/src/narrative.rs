//! Narrative enrichment through an external text-generation model.

use std::sync::Arc;

use async_trait::async_trait;
use mtaa_core::{MtaaError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Anything that turns a prompt into text with a named model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate up to `max_tokens` tokens of text for `prompt` using `model`.
    async fn generate_text(&self, model: &str, prompt: &str, max_tokens: u32) -> Result<String>;
}

/// Models used by the [`Narrator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarratorConfig {
    /// Model tried first.
    pub primary_model: String,

    /// Model tried when the primary fails.
    pub fallback_model: String,

    /// Token limit per generation.
    pub max_tokens: u32,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            primary_model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            fallback_model: "microsoft/DialoGPT-medium".to_string(),
            max_tokens: 300,
        }
    }
}

/// Calls a primary model, then a fallback model.
#[derive(Clone)]
pub struct Narrator {
    generator: Arc<dyn TextGenerator>,
    config: NarratorConfig,
}

impl Narrator {
    /// Create a narrator over a text generator.
    pub fn new(generator: Arc<dyn TextGenerator>, config: NarratorConfig) -> Self {
        Self { generator, config }
    }

    /// Get the narrator configuration.
    pub fn config(&self) -> &NarratorConfig {
        &self.config
    }

    async fn try_model(&self, model: &str, prompt: &str) -> Result<String> {
        let text = self
            .generator
            .generate_text(model, prompt, self.config.max_tokens)
            .await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(MtaaError::Model {
                model: model.to_string(),
                message: "empty response".to_string(),
            });
        }
        Ok(text.to_string())
    }

    /// Generate text with the primary model, falling back to the secondary.
    /// Returns the last model error if both fail.
    pub async fn narrate(&self, prompt: &str) -> Result<String> {
        match self.try_model(&self.config.primary_model, prompt).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("Primary model failed, trying fallback: {}", e);
                let text = self.try_model(&self.config.fallback_model, prompt).await?;
                debug!("Fallback model {} answered", self.config.fallback_model);
                Ok(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers only for the listed models and records every call.
    struct ScriptedGenerator {
        working: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate_text(&self, model: &str, _prompt: &str, _max: u32) -> Result<String> {
            self.calls.lock().unwrap().push(model.to_string());
            if self.working.contains(&model) {
                Ok(format!("  text from {}  ", model))
            } else {
                Err(MtaaError::Model {
                    model: model.to_string(),
                    message: "unavailable".to_string(),
                })
            }
        }
    }

    fn narrator(working: Vec<&'static str>) -> (Narrator, Arc<ScriptedGenerator>) {
        let generator = Arc::new(ScriptedGenerator {
            working,
            calls: Mutex::new(Vec::new()),
        });
        let config = NarratorConfig {
            primary_model: "primary".to_string(),
            fallback_model: "fallback".to_string(),
            max_tokens: 50,
        };
        (Narrator::new(generator.clone(), config), generator)
    }

    #[tokio::test]
    async fn test_primary_used_first() {
        let (narrator, generator) = narrator(vec!["primary", "fallback"]);
        assert_eq!(narrator.narrate("hi").await.unwrap(), "text from primary");
        assert_eq!(*generator.calls.lock().unwrap(), vec!["primary"]);
    }

    #[tokio::test]
    async fn test_fallback_on_primary_failure() {
        let (narrator, generator) = narrator(vec!["fallback"]);
        assert_eq!(narrator.narrate("hi").await.unwrap(), "text from fallback");
        assert_eq!(*generator.calls.lock().unwrap(), vec!["primary", "fallback"]);
    }

    #[tokio::test]
    async fn test_both_fail() {
        let (narrator, _) = narrator(vec![]);
        let err = narrator.narrate("hi").await.unwrap_err();
        assert!(matches!(err, MtaaError::Model { ref model, .. } if model == "fallback"));
    }
}
