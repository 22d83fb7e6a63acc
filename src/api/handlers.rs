//! API request handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::response::sse::Sse;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use futures::future;
use futures::stream;
use futures::StreamExt;
use serde_json::json;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::api::types::ChatRequestBody;
use crate::api::types::ErrorResponse;
use crate::api::types::HealthResponse;
use crate::errors::CopilotError;
use crate::rag::CopilotService;
use crate::rag::StreamingChatResponse;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub copilot: Arc<CopilotService>,
}

impl AppState {
    pub fn new(copilot: CopilotService) -> Self {
        Self {
            copilot: Arc::new(copilot),
        }
    }
}

/// A pipeline error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub CopilotError);

impl From<CopilotError> for ApiError {
    fn from(err: CopilotError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CopilotError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CopilotError::UpstreamRateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            CopilotError::ConfigError(_)
            | CopilotError::TomlParsing(_)
            | CopilotError::Io(_)
            | CopilotError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CopilotError::RetrievalError(_)
            | CopilotError::GenerationError(_)
            | CopilotError::Upstream { .. }
            | CopilotError::HttpError(_)
            | CopilotError::StreamingError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Chat request failed: {}", self.0);
        } else {
            warn!("Chat request rejected: {}", self.0);
        }

        let mut response = (status, Json(ErrorResponse::from(&self.0))).into_response();
        if let CopilotError::UpstreamRateLimited {
            retry_after: Some(delay),
            ..
        } = &self.0
        {
            if let Ok(value) = HeaderValue::from_str(&delay.as_secs().to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Chat handler: JSON reply, or an SSE stream when asked for one
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload.map_err(|e| CopilotError::InvalidRequest(e.body_text()))?;
    let stream = body.stream || wants_event_stream(&headers);
    info!("POST chat (stream: {})", stream);

    let request = body.into_request();
    if stream {
        let response = state.copilot.get_chat_response_stream(&request).await?;
        Ok(sse_response(response).into_response())
    } else {
        let response = state.copilot.get_chat_response(&request).await?;
        Ok(Json(response).into_response())
    }
}

fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"))
}

/// One `context` event, one default event per fragment, and an `error` event on failure
fn sse_response(
    response: StreamingChatResponse,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let StreamingChatResponse { reply, context } = response;

    let context_event = Event::default()
        .event("context")
        .data(json!({ "context": context }).to_string());

    let reply_events = reply.scan(false, |failed, item| {
        if *failed {
            return future::ready(None);
        }
        let event = match item {
            Ok(fragment) => Event::default().data(json!({ "reply": fragment }).to_string()),
            Err(e) => {
                error!("Reply stream failed: {}", e);
                *failed = true;
                Event::default()
                    .event("error")
                    .data(json!({ "error": e.to_string() }).to_string())
            }
        };
        future::ready(Some(Ok(event)))
    });

    Sse::new(stream::once(future::ready(Ok(context_event))).chain(reply_events))
        .keep_alive(KeepAlive::default())
}
