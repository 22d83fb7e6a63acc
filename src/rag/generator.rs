//! Grounded reply generation

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::errors::CopilotError;
use crate::errors::Result;
use crate::llm::ChatModel;
use crate::llm::ChatParams;
use crate::llm::CopilotPrompts;
use crate::llm::PromptTemplate;
use crate::llm::ReplyStream;
use crate::models::Conversation;
use crate::models::RetrievalResult;
use crate::models::Turn;
use crate::rag::ContextAssembler;

/// Answers an utterance from retrieved passages
#[derive(Clone)]
pub struct ResponseGenerator {
    model: Arc<dyn ChatModel>,
    params: ChatParams,
    system_template: PromptTemplate,
    assembler: ContextAssembler,
}

impl ResponseGenerator {
    pub fn new(model: Arc<dyn ChatModel>, params: ChatParams) -> Self {
        Self {
            model,
            params,
            system_template: CopilotPrompts::grounded_chat(),
            assembler: ContextAssembler::new(),
        }
    }

    /// `[system, history..., user]`
    pub fn build_messages(
        &self,
        utterance: &str,
        history: &Conversation,
        context: &RetrievalResult,
    ) -> Vec<Turn> {
        let mut variables = HashMap::new();
        variables.insert("documents".to_string(), self.assembler.assemble(context));

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Turn::system(self.system_template.render(&variables)));
        messages.extend(history.iter().cloned());
        messages.push(Turn::user(utterance));
        messages
    }

    /// Wait for the complete reply
    ///
    /// # Errors
    /// - `GenerationError` when the chat call fails
    /// - `UpstreamRateLimited` when the chat endpoint throttles
    pub async fn generate(
        &self,
        utterance: &str,
        history: &Conversation,
        context: &RetrievalResult,
    ) -> Result<String> {
        let messages = self.build_messages(utterance, history, context);
        debug!("Generating reply from {} messages", messages.len());

        self.model
            .chat(&messages, self.params)
            .await
            .map_err(|e| e.into_generation())
    }

    /// Open a reply stream; returns once the upstream stream is established
    ///
    /// Errors raised while the stream is consumed arrive as stream items, re-tagged the same way.
    ///
    /// # Errors
    /// - `GenerationError` when the chat stream cannot be opened
    /// - `UpstreamRateLimited` when the chat endpoint throttles
    pub async fn generate_stream(
        &self,
        utterance: &str,
        history: &Conversation,
        context: &RetrievalResult,
    ) -> Result<ReplyStream> {
        let messages = self.build_messages(utterance, history, context);
        debug!("Streaming reply from {} messages", messages.len());

        let stream = self
            .model
            .chat_stream(&messages, self.params)
            .await
            .map_err(|e| e.into_generation())?;

        Ok(stream.map_errors(CopilotError::into_generation))
    }
}
