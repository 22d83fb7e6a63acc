//! LLM capabilities: text completion and chat completion
//!
//! The pipeline only talks to the [`CompletionModel`] and [`ChatModel`] traits, so the hosted
//! endpoint can be swapped for a mock in tests. [`LlmClient`] is the REST implementation for
//! Azure OpenAI and OpenAI-compatible endpoints.

pub mod client;
pub mod prompts;
pub mod streaming;

use std::collections::HashMap;

use async_trait::async_trait;

pub use client::LlmClient;
pub use prompts::CopilotPrompts;
pub use prompts::PromptTemplate;
pub use streaming::ReplyStream;

use crate::errors::Result;
use crate::models::Turn;

/// Sampling parameters for a chat call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            temperature: 0.2,
        }
    }
}

/// Bounded-length text completion
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(
        &self,
        template: &PromptTemplate,
        variables: &HashMap<String, String>,
        max_tokens: u32,
    ) -> Result<String>;
}

/// Chat completion, blocking or streamed
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Wait for the whole reply
    async fn chat(&self, messages: &[Turn], params: ChatParams) -> Result<String>;

    /// Return as soon as the stream is established
    async fn chat_stream(&self, messages: &[Turn], params: ChatParams) -> Result<ReplyStream>;
}
