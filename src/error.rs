//! Error types
//!
//! Everything below `ValidationError` is converted into an empty or partial
//! contribution by the aggregator; only invalid input and internal faults are
//! ever surfaced to a caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Rejected request input, detected before any I/O happens
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("queries must be a non-empty list")]
    MissingQueries,

    #[error("query at index {0} is blank")]
    BlankQuery(usize),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("maxTotalChars must be greater than zero")]
    ZeroBudget,
}

/// Failure of the search index call for one query
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("search index returned HTTP {0}")]
    Status(u16),

    #[error("invalid search response: {0}")]
    Parse(String),

    #[error("search request could not be built: {0}")]
    Request(String),
}

/// Classified transport-level failure of a single HTTP exchange
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("connection reset")]
    ConnectionReset,

    #[error("connect error: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Connection resets, refusals and timeouts are transient
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout
                | TransportError::ConnectionRefused
                | TransportError::ConnectionReset
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return TransportError::Timeout;
        }

        // Look through the source chain for the underlying socket error
        let mut source = std::error::Error::source(&e);
        while let Some(err) = source {
            if let Some(io) = err.downcast_ref::<std::io::Error>() {
                match io.kind() {
                    std::io::ErrorKind::ConnectionRefused => {
                        return TransportError::ConnectionRefused
                    }
                    std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe => return TransportError::ConnectionReset,
                    std::io::ErrorKind::TimedOut => return TransportError::Timeout,
                    _ => {}
                }
            }
            source = err.source();
        }

        if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// Per-URL failure once retries are exhausted or a permanent error occurred
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Whether another attempt may succeed, given the retryable status set
    pub fn is_retryable(&self, retryable_statuses: &[u16]) -> bool {
        match self {
            FetchError::Status(code) => retryable_statuses.contains(code),
            FetchError::Transport(e) => e.is_retryable(),
            FetchError::Timeout(_) => true,
        }
    }
}

/// Invalid startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },

    #[error("HTTP client could not be built: {0}")]
    Client(String),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Errors returned by the web layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid request body: {0}")]
    Body(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) | ApiError::Body(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_retryable() {
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::ConnectionRefused.is_retryable());
        assert!(TransportError::ConnectionReset.is_retryable());
        assert!(!TransportError::Connect("dns".into()).is_retryable());
        assert!(!TransportError::Other("tls".into()).is_retryable());
    }

    #[test]
    fn test_fetch_error_retryable() {
        let statuses = [429, 502, 503, 504];
        assert!(FetchError::Status(503).is_retryable(&statuses));
        assert!(FetchError::Status(429).is_retryable(&statuses));
        assert!(!FetchError::Status(404).is_retryable(&statuses));
        assert!(!FetchError::Status(500).is_retryable(&statuses));
        assert!(FetchError::Timeout(Duration::from_secs(1)).is_retryable(&statuses));
    }

    #[test]
    fn test_api_error_status() {
        let resp = ApiError::from(ValidationError::MissingQueries).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError::Internal("boom".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
