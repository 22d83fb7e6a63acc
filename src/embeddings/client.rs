//! Embedding API client for Azure OpenAI and OpenAI-compatible endpoints

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::config::LlmConfig;
use crate::embeddings::EmbeddingModel;
use crate::errors::CopilotError;
use crate::errors::Result;
use crate::http::build_client;
use crate::http::check_response;
use crate::llm::client::authorize;
use crate::llm::client::body_model;
use crate::llm::client::operation_url;

const SERVICE: &str = "embeddings";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for an embedding deployment
#[derive(Clone)]
pub struct EmbeddingClient {
    config: LlmConfig,
    client: Client,
}

impl EmbeddingClient {
    pub fn new(config: LlmConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let client = build_client(config.request_timeout())?;
        Ok(Self::new(config.llm.clone(), client))
    }

    pub fn embeddings_url(&self) -> String {
        operation_url(&self.config, &self.config.embedding_deployment, "embeddings")
    }
}

#[async_trait]
impl EmbeddingModel for EmbeddingClient {
    /// Generate embedding for a single text
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Throttling, reported as `UpstreamRateLimited`
    /// - Invalid API responses (malformed JSON, no embedding in the response)
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.embeddings_url();
        debug!("Calling embeddings API: {}", url);

        let request = EmbeddingRequest {
            input: text,
            model: body_model(&self.config, &self.config.embedding_deployment),
        };

        let response = authorize(self.client.post(&url), &self.config)
            .json(&request)
            .send()
            .await?;
        let response = check_response(response, SERVICE).await?;

        let result: EmbeddingResponse = response.json().await.map_err(|e| {
            CopilotError::RetrievalError(format!("Failed to parse embedding response: {e}"))
        })?;

        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| CopilotError::RetrievalError("No embedding in response".to_string()))
    }
}
