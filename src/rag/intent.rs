//! Intent resolution: turn a follow-up utterance into a standalone search query

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::errors::Result;
use crate::llm::CompletionModel;
use crate::llm::CopilotPrompts;
use crate::llm::PromptTemplate;
use crate::models::Conversation;

/// Rewrites the latest utterance using the conversation so far
#[derive(Clone)]
pub struct IntentResolver {
    model: Arc<dyn CompletionModel>,
    template: PromptTemplate,
    max_tokens: u32,
}

impl IntentResolver {
    pub fn new(model: Arc<dyn CompletionModel>, max_tokens: u32) -> Self {
        Self {
            model,
            template: CopilotPrompts::query_intent(),
            max_tokens,
        }
    }

    /// Resolve the search query for `utterance`
    ///
    /// Without history the utterance is already standalone and is returned as is. Otherwise the
    /// completion output is returned verbatim.
    ///
    /// # Errors
    /// - `GenerationError` when the completion call fails
    /// - `UpstreamRateLimited` when the completion endpoint throttles
    pub async fn resolve_query(&self, utterance: &str, history: &Conversation) -> Result<String> {
        if history.is_empty() {
            debug!("No chat history, using utterance as the search query");
            return Ok(utterance.to_string());
        }

        let mut variables = HashMap::new();
        variables.insert("chat_history".to_string(), history.transcript());
        variables.insert("query".to_string(), utterance.to_string());

        let query = self
            .model
            .complete(&self.template, &variables, self.max_tokens)
            .await
            .map_err(|e| e.into_generation())?;

        debug!("Resolved search query: {}", query);
        Ok(query)
    }
}
