//! REST client for a hosted search index

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::SearchConfig;
use crate::errors::CopilotError;
use crate::errors::Result;
use crate::http::check_response;
use crate::models::RetrievedPassage;
use crate::search::VectorSearch;

const SERVICE: &str = "search";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    search: &'a str,
    vector_queries: [VectorQuery<'a>; 1],
    select: String,
    top: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VectorQuery<'a> {
    kind: &'static str,
    vector: &'a [f32],
    k: usize,
    fields: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    value: Vec<serde_json::Map<String, Value>>,
}

/// Client for one index of a search service
#[derive(Clone)]
pub struct SearchIndexClient {
    config: SearchConfig,
    client: Client,
}

impl SearchIndexClient {
    pub fn new(config: SearchConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.index_name,
            self.config.api_version
        )
    }
}

/// Read a hit field as text; numeric ids are stringified
fn field_as_string(hit: &serde_json::Map<String, Value>, field: &str) -> Result<String> {
    match hit.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Null) | None => Err(CopilotError::RetrievalError(format!(
            "search hit is missing field '{field}'"
        ))),
        Some(other) => Ok(other.to_string()),
    }
}

fn to_passage(hit: &serde_json::Map<String, Value>) -> Result<RetrievedPassage> {
    Ok(RetrievedPassage {
        id: field_as_string(hit, "id")?,
        content: field_as_string(hit, "content")?,
    })
}

#[async_trait]
impl VectorSearch for SearchIndexClient {
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        fields: &[&str],
    ) -> Result<Vec<RetrievedPassage>> {
        let url = self.search_url();
        debug!("Vector search on index {} (k={})", self.config.index_name, k);

        let request = SearchRequest {
            search: "",
            vector_queries: [VectorQuery {
                kind: "vector",
                vector,
                k,
                fields: &self.config.vector_field,
            }],
            select: fields.join(","),
            top: k,
        };

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_response(response, SERVICE).await?;

        let result: SearchResponse = response.json().await.map_err(|e| {
            CopilotError::RetrievalError(format!("Failed to parse search response: {e}"))
        })?;

        // Service order is the relevance order
        result.value.iter().map(to_passage).collect()
    }
}
