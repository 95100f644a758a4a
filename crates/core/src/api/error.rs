//! Error types for backend API calls.

use thiserror::Error;

/// Errors returned by [`MonitorApi`](super::MonitorApi) implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (connection, timeout, TLS).
    #[error("Network failure: {0}")]
    Network(String),

    /// The backend does not know the requested resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend answered with a non-success status code.
    #[error("Backend returned HTTP {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    /// The response body did not have the expected shape.
    #[error("Failed to decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    /// The request could not be built from the given arguments.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Type alias for Result with ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
