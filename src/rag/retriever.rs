//! Retrieval of grounding passages from the vector index

use std::sync::Arc;

use tracing::debug;

use crate::embeddings::EmbeddingModel;
use crate::errors::Result;
use crate::models::RetrievalResult;
use crate::search::VectorSearch;
use crate::search::PASSAGE_FIELDS;

/// Embeds a query and pulls its nearest passages
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingModel>,
    index: Arc<dyn VectorSearch>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingModel>, index: Arc<dyn VectorSearch>) -> Self {
        Self { embedder, index }
    }

    /// Up to `limit` passages for `query`, in the order the index ranked them
    ///
    /// # Errors
    /// - `RetrievalError` when embedding or search fails
    /// - `UpstreamRateLimited` when either service throttles
    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<RetrievalResult> {
        if limit == 0 {
            return Ok(RetrievalResult::default());
        }

        debug!("Embedding search query");
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| e.into_retrieval())?;

        debug!("Searching for {} nearest passages", limit);
        let hits = self
            .index
            .search(&vector, limit, &PASSAGE_FIELDS)
            .await
            .map_err(|e| e.into_retrieval())?;

        let result = RetrievalResult::from_ranked(hits, limit);
        debug!("Retrieved {} passages", result.len());
        Ok(result)
    }
}
