use reqwest::StatusCode;
use thiserror::Error;

use crate::response::BodyDecodeError;

/// Failure talking to the platform API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The body of a successful response was not the JSON we expected.
    #[error(transparent)]
    Decode(#[from] BodyDecodeError),

    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// Whether retrying the same request later may succeed.
    ///
    /// Connection failures, timeouts, rate limiting and 5xx responses are
    /// transient. Client errors and undecodable bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(error) => error.is_timeout() || error.is_connect() || error.is_request(),
            ApiError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || (500..=599).contains(status)
            }
            ApiError::Decode(_) | ApiError::InvalidBaseUrl { .. } | ApiError::InvalidHeader(_) | ApiError::Client(_) => false,
        }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::Status {
            status: code,
            message: String::new(),
        }
    }

    #[test]
    fn server_errors_and_rate_limits_are_transient() {
        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!status(400).is_transient());
        assert!(!status(401).is_transient());
        assert!(!status(404).is_transient());
        assert_eq!(status(404).status(), Some(404));
    }
}
