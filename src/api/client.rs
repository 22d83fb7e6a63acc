//! Client for a deployed copilot endpoint

use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;

use crate::api::types::ChatRequestBody;
use crate::errors::Result;
use crate::http::build_client;
use crate::http::check_response;
use crate::llm::streaming::sse_lines;
use crate::llm::streaming::FragmentStream;
use crate::models::ChatRequest;
use crate::models::ChatResponse;

const SERVICE: &str = "endpoint";

/// Calls `/score`-style endpoints, optionally behind a bearer token
#[derive(Clone)]
pub struct EndpointClient {
    url: String,
    token: Option<String>,
    client: Client,
}

impl EndpointClient {
    pub fn new(url: impl Into<String>, token: Option<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            token,
            client,
        }
    }

    pub fn with_timeout(
        url: impl Into<String>,
        token: Option<String>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        Ok(Self::new(url, token, build_client(timeout)?))
    }

    fn post(&self, request: &ChatRequest, stream: bool, accept: &str) -> reqwest::RequestBuilder {
        let mut body = ChatRequestBody::from(request);
        body.stream = stream;

        let builder = self.client.post(&self.url).header(ACCEPT, accept).json(&body);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Ask for a complete JSON reply
    ///
    /// # Errors
    /// - Transport failures and non-success statuses
    /// - A body that is not `{"reply", "context"}`
    pub async fn invoke(&self, request: &ChatRequest) -> Result<ChatResponse> {
        debug!("Invoking {}", self.url);
        let response = self
            .post(request, false, "application/json")
            .send()
            .await?;
        let response = check_response(response, SERVICE).await?;
        Ok(response.json().await?)
    }

    /// Ask for an event stream; its non-empty lines are yielded as they arrive
    ///
    /// Returns once the response headers are in.
    ///
    /// # Errors
    /// - Transport failures and non-success statuses
    /// - Body failures surface as `StreamingError` items
    pub async fn invoke_stream(&self, request: &ChatRequest) -> Result<FragmentStream> {
        debug!("Invoking {} (stream)", self.url);
        let response = self
            .post(request, true, "text/event-stream")
            .send()
            .await?;
        let response = check_response(response, SERVICE).await?;

        Ok(Box::pin(sse_lines(response.bytes_stream())))
    }
}
