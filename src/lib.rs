//! Retrieval-augmented chat copilot
//!
//! A chat turn runs through three stages: the latest utterance is rewritten into a standalone
//! search query, the query is embedded and matched against a search index, and a chat model
//! answers from the retrieved passages. See [`rag`] for the pipeline and [`api`] for the HTTP
//! surface.

pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod http;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;
pub mod search;

#[cfg(test)]
pub mod tests;

pub use config::AppConfig;
pub use errors::*;
