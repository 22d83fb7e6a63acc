//! REST client for chat and completion deployments

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::LlmConfig;
use crate::config::LlmProvider;
use crate::errors::CopilotError;
use crate::errors::Result;
use crate::http::check_response;
use crate::llm::streaming::chat_deltas;
use crate::llm::ChatModel;
use crate::llm::ChatParams;
use crate::llm::CompletionModel;
use crate::llm::PromptTemplate;
use crate::llm::ReplyStream;
use crate::models::Turn;

const SERVICE: &str = "chat";

/// URL of an operation (`chat/completions`, `embeddings`) on a deployment
pub(crate) fn operation_url(config: &LlmConfig, deployment: &str, operation: &str) -> String {
    let endpoint = config.endpoint.trim_end_matches('/');
    match config.provider {
        LlmProvider::Azure => format!(
            "{endpoint}/openai/deployments/{deployment}/{operation}?api-version={}",
            config.api_version
        ),
        LlmProvider::OpenAI => format!("{endpoint}/{operation}"),
    }
}

/// Attach the provider's credentials to a request
pub(crate) fn authorize(builder: RequestBuilder, config: &LlmConfig) -> RequestBuilder {
    match config.provider {
        LlmProvider::Azure => builder.header("api-key", &config.api_key),
        LlmProvider::OpenAI => builder.bearer_auth(&config.api_key),
    }
}

/// Model name sent in the body; Azure encodes it in the URL instead
pub(crate) fn body_model<'a>(config: &LlmConfig, deployment: &'a str) -> Option<&'a str> {
    match config.provider {
        LlmProvider::Azure => None,
        LlmProvider::OpenAI => Some(deployment),
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [Turn],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for a chat-completion deployment
#[derive(Clone)]
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

impl LlmClient {
    /// Create a client sharing one HTTP connection pool
    pub fn new(config: LlmConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn chat_url(&self) -> String {
        operation_url(&self.config, &self.config.chat_deployment, "chat/completions")
    }

    async fn send_chat(
        &self,
        messages: &[Turn],
        max_tokens: u32,
        temperature: Option<f32>,
        stream: bool,
    ) -> Result<Response> {
        let url = self.chat_url();
        debug!(
            "Calling chat completions: {} ({} messages, stream={})",
            url,
            messages.len(),
            stream
        );

        let request = ChatCompletionRequest {
            model: body_model(&self.config, &self.config.chat_deployment),
            messages,
            max_tokens,
            temperature,
            stream,
        };

        let response = authorize(self.client.post(&url), &self.config)
            .json(&request)
            .send()
            .await?;

        check_response(response, SERVICE).await
    }

    async fn send_and_read(
        &self,
        messages: &[Turn],
        max_tokens: u32,
        temperature: Option<f32>,
    ) -> Result<String> {
        let response = self
            .send_chat(messages, max_tokens, temperature, false)
            .await?;

        let result: ChatCompletionResponse = response.json().await.map_err(|e| {
            CopilotError::GenerationError(format!("Failed to parse chat response: {e}"))
        })?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| CopilotError::GenerationError("No choices in chat response".to_string()))
    }
}

#[async_trait]
impl CompletionModel for LlmClient {
    async fn complete(
        &self,
        template: &PromptTemplate,
        variables: &HashMap<String, String>,
        max_tokens: u32,
    ) -> Result<String> {
        let missing = template.missing_variables(variables);
        if !missing.is_empty() {
            return Err(CopilotError::GenerationError(format!(
                "prompt variables not provided: {}",
                missing.join(", ")
            )));
        }

        let prompt = template.render(variables);
        self.send_and_read(&[Turn::user(prompt)], max_tokens, None)
            .await
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn chat(&self, messages: &[Turn], params: ChatParams) -> Result<String> {
        self.send_and_read(messages, params.max_tokens, Some(params.temperature))
            .await
    }

    async fn chat_stream(&self, messages: &[Turn], params: ChatParams) -> Result<ReplyStream> {
        let response = self
            .send_chat(messages, params.max_tokens, Some(params.temperature), true)
            .await?;
        Ok(chat_deltas(response.bytes_stream()))
    }
}
