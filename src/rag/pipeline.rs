//! Complete copilot pipeline: Resolve intent -> Retrieve -> Generate

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::config::CopilotConfig;
use crate::embeddings::EmbeddingClient;
use crate::embeddings::EmbeddingModel;
use crate::errors::CopilotError;
use crate::errors::Result;
use crate::http::build_client;
use crate::llm::ChatModel;
use crate::llm::ChatParams;
use crate::llm::CompletionModel;
use crate::llm::LlmClient;
use crate::llm::ReplyStream;
use crate::models::ChatRequest;
use crate::models::ChatResponse;
use crate::models::RetrievalResult;
use crate::rag::IntentResolver;
use crate::rag::ResponseGenerator;
use crate::rag::Retriever;
use crate::search::SearchIndexClient;
use crate::search::VectorSearch;

/// Reply stream together with the passages it is grounded on
#[derive(Debug)]
pub struct StreamingChatResponse {
    pub reply: ReplyStream,
    pub context: RetrievalResult,
}

impl StreamingChatResponse {
    /// Drain the stream into a blocking response
    ///
    /// # Errors
    /// - The first error raised by the reply stream
    pub async fn into_response(self) -> Result<ChatResponse> {
        Ok(ChatResponse {
            reply: self.reply.collect_all().await?,
            context: self.context,
        })
    }
}

/// The copilot: cheap to clone, holds only shared client handles
#[derive(Clone)]
pub struct CopilotService {
    intent: IntentResolver,
    retriever: Retriever,
    generator: ResponseGenerator,
    retrieval_limit: usize,
}

impl CopilotService {
    /// Create the service over the hosted endpoints named in `config`
    ///
    /// # Errors
    /// - `ConfigError` when required settings are missing or invalid
    /// - HTTP client construction errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let client = build_client(config.request_timeout())?;
        let llm = Arc::new(LlmClient::new(config.llm.clone(), client.clone()));
        let embedder = Arc::new(EmbeddingClient::new(config.llm.clone(), client.clone()));
        let index = Arc::new(SearchIndexClient::new(config.search.clone(), client));

        Ok(Self::from_capabilities(
            llm.clone(),
            embedder,
            index,
            llm,
            &config.copilot,
        ))
    }

    /// Create from existing capabilities
    #[must_use]
    pub fn from_capabilities(
        completion: Arc<dyn CompletionModel>,
        embedder: Arc<dyn EmbeddingModel>,
        index: Arc<dyn VectorSearch>,
        chat: Arc<dyn ChatModel>,
        config: &CopilotConfig,
    ) -> Self {
        let params = ChatParams {
            max_tokens: config.reply_max_tokens,
            temperature: config.temperature,
        };

        Self {
            intent: IntentResolver::new(completion, config.intent_max_tokens),
            retriever: Retriever::new(embedder, index),
            generator: ResponseGenerator::new(chat, params),
            retrieval_limit: config.retrieval_limit,
        }
    }

    /// Answer one chat turn and wait for the whole reply
    ///
    /// # Errors
    /// - `InvalidRequest` when `chat_input` is blank
    /// - `GenerationError` when intent resolution or reply generation fails
    /// - `RetrievalError` when embedding or search fails
    /// - `UpstreamRateLimited` when any upstream throttles
    pub async fn get_chat_response(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let span = request_span();
        async {
            let context = self.resolve_and_retrieve(request).await?;

            debug!("Step 3: Generating reply");
            let reply = self
                .generator
                .generate(&request.chat_input, &request.chat_history, &context)
                .await?;

            info!("Chat response completed ({} passages)", context.len());
            Ok(ChatResponse { reply, context })
        }
        .instrument(span)
        .await
    }

    /// Answer one chat turn as a fragment stream
    ///
    /// Returns as soon as the chat stream is established; the passages are available
    /// immediately.
    ///
    /// # Errors
    /// - Same as [`Self::get_chat_response`], up to opening the stream
    pub async fn get_chat_response_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<StreamingChatResponse> {
        let span = request_span();
        async {
            let context = self.resolve_and_retrieve(request).await?;

            debug!("Step 3: Opening reply stream");
            let reply = self
                .generator
                .generate_stream(&request.chat_input, &request.chat_history, &context)
                .await?;

            info!("Chat stream established ({} passages)", context.len());
            Ok(StreamingChatResponse { reply, context })
        }
        .instrument(span)
        .await
    }

    async fn resolve_and_retrieve(&self, request: &ChatRequest) -> Result<RetrievalResult> {
        if request.chat_input.trim().is_empty() {
            return Err(CopilotError::InvalidRequest(
                "chat_input must not be empty".to_string(),
            ));
        }
        info!(
            "Processing chat input ({} history turns)",
            request.chat_history.len()
        );

        debug!("Step 1: Resolving intent");
        let query = self
            .intent
            .resolve_query(&request.chat_input, &request.chat_history)
            .await?;

        debug!("Step 2: Retrieving passages");
        self.retriever.retrieve(&query, self.retrieval_limit).await
    }
}

fn request_span() -> tracing::Span {
    tracing::info_span!("chat", request_id = %Uuid::new_v4())
}
