//! Per-exchange proxy errors.
//!
//! Every variant that can happen while serving a request is answered with
//! `502 Bad Gateway` and a short plain-text diagnostic. None of them outlive
//! the exchange that produced them.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid upstream URL '{url}': {reason}")]
    InvalidUpstream { url: String, reason: String },

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("failed to read upstream response body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("failed to encode rewritten response body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ProxyError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidUpstream { .. } => "invalid_upstream",
            ProxyError::Upstream(_) => "transport",
            ProxyError::UpstreamTimeout(_) => "timeout",
            ProxyError::BodyRead(_) => "body_read",
            ProxyError::Encode(_) => "encode",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_GATEWAY, format!("Proxy error: {}", self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_bad_gateway_with_diagnostic() {
        let response = ProxyError::UpstreamTimeout(Duration::from_secs(3)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Proxy error: upstream did not respond within 3s");
    }
}
