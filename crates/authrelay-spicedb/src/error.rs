//! SpiceDB client error types.

use thiserror::Error;

/// Result type for SpiceDB client operations.
pub type SpiceDbResult<T> = Result<T, SpiceDbError>;

/// Errors that can occur while talking to SpiceDB.
#[derive(Debug, Error)]
pub enum SpiceDbError {
    /// The service answered with an error status, or a streaming response
    /// carried an error frame. `code` is the status as reported by the
    /// service: an HTTP status for rejected requests, a gRPC status code
    /// for in-stream error frames.
    #[error("{message}")]
    Api { code: i32, message: String },

    /// The service could not be reached, the request timed out, or the
    /// connection dropped mid-response.
    #[error("failed to reach SpiceDB: {message}")]
    Connection { message: String },

    /// A response payload did not match the expected wire shape.
    #[error("invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured endpoint is not a valid URL.
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl SpiceDbError {
    /// Create a service-reported error.
    pub fn api(code: i32, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Whether retrying the request may succeed.
    ///
    /// Connection failures are always worth one retry. Service errors are
    /// transient only for throttling and gateway-level unavailability
    /// (HTTP 429/502/503/504) and gRPC UNAVAILABLE (14).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::Api { code, .. } => matches!(code, 14 | 429 | 502 | 503 | 504),
            _ => false,
        }
    }
}
