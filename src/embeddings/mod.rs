//! Embeddings generation module
//!
//! Query text is turned into a fixed-dimension vector before it is sent to the search index.
//! The dimension is whatever the deployed model produces; it has to match the vector field of
//! the index.

pub mod client;

use async_trait::async_trait;

pub use client::EmbeddingClient;

use crate::errors::Result;

/// Default embedding dimension for text-embedding-ada-002
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// One input string in, one vector out
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
