//! Shared reqwest plumbing for upstream services

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use reqwest::Response;
use reqwest::StatusCode;
use tracing::warn;

use crate::errors::CopilotError;
use crate::errors::Result;

/// Build an HTTP client with a uniform per-request timeout
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| CopilotError::HttpError(e.to_string()))
}

/// Turn a non-success response into the matching error
pub async fn check_response(response: Response, service: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        warn!("{} throttled the request (retry after {:?})", service, retry_after);
        return Err(CopilotError::UpstreamRateLimited {
            service: service.to_string(),
            retry_after,
        });
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(CopilotError::Upstream {
        service: service.to_string(),
        status: status.as_u16(),
        message,
    })
}

/// `Retry-After` in delta-seconds form; HTTP-date values are ignored
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_retry_after(" 30 "), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(5)).is_ok());
    }
}
