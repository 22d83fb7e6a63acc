//! Vector search over a pre-built index

pub mod client;

use async_trait::async_trait;

pub use client::SearchIndexClient;

use crate::errors::Result;
use crate::models::RetrievedPassage;

/// Fields every hit is reduced to
pub const PASSAGE_FIELDS: [&str; 2] = ["id", "content"];

/// Nearest-neighbour search
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Up to `k` hits for `vector`, most relevant first
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        fields: &[&str],
    ) -> Result<Vec<RetrievedPassage>>;
}
