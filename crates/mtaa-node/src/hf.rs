//! Text generation through the Hugging Face inference API.

use std::time::Duration;

use async_trait::async_trait;
use mtaa_core::{MtaaError, Result};
use mtaa_planner::TextGenerator;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Client for hosted text-generation models.
#[derive(Clone)]
pub struct HuggingFaceGenerator {
    /// Base URL; the model id is appended.
    endpoint: String,

    /// Bearer token, if any.
    token: Option<String>,

    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

impl HuggingFaceGenerator {
    /// Create a client for `endpoint`.
    pub fn new(endpoint: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MtaaError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
            http_client,
        })
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.endpoint, model)
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceGenerator {
    async fn generate_text(&self, model: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let model_error = |message: String| MtaaError::Model {
            model: model.to_string(),
            message,
        };

        let request = GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_new_tokens: max_tokens,
                return_full_text: false,
            },
        };

        let mut builder = self.http_client.post(self.model_url(model)).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| model_error(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(model_error(format!("{}: {}", status, body)));
        }

        let generations: Vec<Generation> = response
            .json()
            .await
            .map_err(|e| model_error(format!("unexpected response: {}", e)))?;

        debug!("Model {} returned {} generations", model, generations.len());

        generations
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| model_error("no generations returned".to_string()))
    }
}
