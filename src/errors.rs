use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CopilotError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Retrieval error: {0}")]
    RetrievalError(String),

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("Upstream {service} is rate limited{}", fmt_retry_after(.retry_after))]
    UpstreamRateLimited {
        service: String,
        retry_after: Option<Duration>,
    },

    #[error("Upstream {service} returned {status}: {message}")]
    Upstream {
        service: String,
        status: u16,
        message: String,
    },

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Streaming error: {0}")]
    StreamingError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),
}

impl CopilotError {
    /// Re-tag a capability failure as a retrieval-stage failure.
    ///
    /// Throttling and configuration errors keep their kind so callers can still tell them apart.
    #[must_use]
    pub fn into_retrieval(self) -> Self {
        match self {
            e @ (Self::UpstreamRateLimited { .. }
            | Self::ConfigError(_)
            | Self::RetrievalError(_)) => e,
            other => Self::RetrievalError(other.to_string()),
        }
    }

    /// Re-tag a capability failure as a generation-stage failure.
    #[must_use]
    pub fn into_generation(self) -> Self {
        match self {
            e @ (Self::UpstreamRateLimited { .. }
            | Self::ConfigError(_)
            | Self::GenerationError(_)) => e,
            other => Self::GenerationError(other.to_string()),
        }
    }

    /// Whether a caller-side retry of the whole pipeline has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamRateLimited { .. } | Self::HttpError(_) | Self::StreamingError(_) => {
                true
            }
            Self::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short machine-readable name, used in API error bodies.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "configuration_error",
            Self::InvalidRequest(_) => "invalid_request",
            Self::RetrievalError(_) => "retrieval_error",
            Self::GenerationError(_) => "generation_error",
            Self::UpstreamRateLimited { .. } => "upstream_rate_limited",
            Self::Upstream { .. } => "upstream_error",
            Self::HttpError(_) => "http_error",
            Self::StreamingError(_) => "streaming_error",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
            Self::TomlParsing(_) => "config_parse_error",
        }
    }
}

fn fmt_retry_after(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|d| format!(" (retry after {}s)", d.as_secs()))
        .unwrap_or_default()
}

impl From<reqwest::Error> for CopilotError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CopilotError>;
