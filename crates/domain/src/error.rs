//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A request path is empty or otherwise unusable.
    #[error("invalid request path: {0}")]
    InvalidPath(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Why a token refresh failed.
///
/// Every variant collapses to the same terminal outcome for callers (the
/// session is over), but the distinction matters for logging and for the
/// transport adapter, which must separate a server rejection from its own
/// transport failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The session has no refresh token to present.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The server rejected the refresh token.
    #[error("refresh rejected by server (status {status})")]
    Rejected {
        /// HTTP status returned by the refresh endpoint.
        status: u16,
    },

    /// The refresh call failed at the transport level.
    #[error("transport failure during refresh: {message}")]
    Transport {
        /// Underlying transport error description.
        message: String,
    },

    /// The response had a success status but no usable access token.
    #[error("refresh response did not contain an access token")]
    MalformedResponse,

    /// The refresh call did not settle within the configured bound.
    #[error("refresh did not complete within {timeout_ms} ms")]
    TimedOut {
        /// The bound that was exceeded, in milliseconds.
        timeout_ms: u64,
    },
}
