//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::errors::CopilotError;
use crate::models::ChatRequest;
use crate::models::Conversation;

/// Chat request body for `/score` and `/api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequestBody {
    pub chat_input: String,
    #[serde(default)]
    pub chat_history: Conversation,
    /// Ask for a server-sent event stream instead of a JSON reply
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequestBody {
    pub fn into_request(self) -> ChatRequest {
        ChatRequest::new(self.chat_input).with_history(self.chat_history)
    }
}

impl From<&ChatRequest> for ChatRequestBody {
    fn from(request: &ChatRequest) -> Self {
        Self {
            chat_input: request.chat_input.clone(),
            chat_history: request.chat_history.clone(),
            stream: false,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

impl From<&CopilotError> for ErrorResponse {
    fn from(err: &CopilotError) -> Self {
        Self {
            error: ErrorDetail {
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        }
    }
}
