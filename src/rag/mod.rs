//! RAG (Retrieval-Augmented Generation) module
//!
//! The copilot answers a chat turn in three sequential stages:
//! - Intent resolution: rewrite the latest utterance into a standalone search query
//!   (skipped when there is no prior conversation)
//! - Retrieval: embed the query and pull the nearest passages from the search index
//! - Generation: answer from the retrieved passages, blocking or as a token stream
//!
//! # Examples
//!
//! ```rust,no_run
//! use copilot_rag::config::AppConfig;
//! use copilot_rag::models::ChatRequest;
//! use copilot_rag::rag::CopilotService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let copilot = CopilotService::new(&config)?;
//!
//!     let request = ChatRequest::new("Are the trailwalker shoes waterproof?");
//!     let response = copilot.get_chat_response(&request).await?;
//!     println!("Reply: {}", response.reply);
//!     println!("Sources: {} passages", response.context.len());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod generator;
pub mod intent;
pub mod pipeline;
pub mod retriever;

pub use context::ContextAssembler;
pub use generator::ResponseGenerator;
pub use intent::IntentResolver;
pub use pipeline::CopilotService;
pub use pipeline::StreamingChatResponse;
pub use retriever::Retriever;
