//! Outcome classification for pipeline stages.
//!
//! Three layers of classification, one per seam:
//!
//! - [`ExecuteOutcome`]: what a single executor attempt produced. The only
//!   place where HTTP 401 is visible; it never escapes the pipeline.
//! - [`RefreshOutcome`]: what the refresh coordinator resolved for its
//!   waiters, either a committed new pair or the end of the session.
//! - [`PipelineOutcome`]: what collaborators receive. `Unauthenticated`
//!   does not exist at this layer.

use crate::response::ResponsePayload;
use crate::token::TokenPair;

/// Classification of a single request attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// The server answered with a success status.
    Success(ResponsePayload),
    /// The server rejected the access token (HTTP 401 exactly).
    Unauthenticated,
    /// Any other failure: error statuses, transport problems, bad input.
    OtherError(RequestErrorKind),
}

impl ExecuteOutcome {
    /// Returns true if the attempt hit the token-rejected signal.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

/// Result of a refresh coordination round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new pair is committed to the store; replay with it.
    Refreshed(TokenPair),
    /// The session cannot be recovered; the store has been cleared.
    SessionExpired,
}

/// Outcome emitted to collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The request (original or replayed) succeeded.
    Success(ResponsePayload),
    /// Terminal for the current session; the caller must route to
    /// re-authentication and drop any cached identity.
    SessionExpired,
    /// Request-local failure with no session impact.
    OtherError(RequestErrorKind),
}

impl PipelineOutcome {
    /// Returns true for a successful outcome.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true for the terminal session-expired outcome.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Returns the response payload for a successful outcome.
    #[must_use]
    pub const fn payload(&self) -> Option<&ResponsePayload> {
        match self {
            Self::Success(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Categories of request-local failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestErrorKind {
    /// The server answered with a non-401 error status.
    Status {
        /// The HTTP status code.
        code: u16,
    },
    /// The request URL could not be built.
    InvalidUrl,
    /// DNS resolution failed.
    DnsError,
    /// Could not establish a connection.
    ConnectionFailed,
    /// The connection was refused.
    ConnectionRefused,
    /// The attempt timed out.
    Timeout,
    /// TLS handshake or certificate failure.
    TlsError,
    /// The request body could not be serialized.
    InvalidBody,
    /// Anything the transport could not classify.
    Unknown,
}

impl RequestErrorKind {
    /// Returns true for failures that never reached the server.
    #[must_use]
    pub const fn is_transport(self) -> bool {
        matches!(
            self,
            Self::DnsError
                | Self::ConnectionFailed
                | Self::ConnectionRefused
                | Self::Timeout
                | Self::TlsError
        )
    }
}

impl std::fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { code } => write!(f, "server returned status {code}"),
            Self::InvalidUrl => write!(f, "invalid request URL"),
            Self::DnsError => write!(f, "DNS resolution failed"),
            Self::ConnectionFailed => write!(f, "connection failed"),
            Self::ConnectionRefused => write!(f, "connection refused"),
            Self::Timeout => write!(f, "request timed out"),
            Self::TlsError => write!(f, "TLS error"),
            Self::InvalidBody => write!(f, "invalid request body"),
            Self::Unknown => write!(f, "unknown request error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_execute_outcome_classification() {
        assert!(ExecuteOutcome::Unauthenticated.is_unauthenticated());
        assert!(!ExecuteOutcome::OtherError(RequestErrorKind::Timeout).is_unauthenticated());
    }

    #[test]
    fn test_pipeline_outcome_helpers() {
        let outcome = PipelineOutcome::Success(ResponsePayload::default());
        assert!(outcome.is_success());
        assert!(outcome.payload().is_some());

        assert!(PipelineOutcome::SessionExpired.is_session_expired());
        assert!(
            PipelineOutcome::OtherError(RequestErrorKind::Status { code: 500 })
                .payload()
                .is_none()
        );
    }

    #[test]
    fn test_error_kind_transport_split() {
        assert!(RequestErrorKind::Timeout.is_transport());
        assert!(RequestErrorKind::ConnectionRefused.is_transport());
        assert!(!RequestErrorKind::Status { code: 500 }.is_transport());
        assert!(!RequestErrorKind::InvalidBody.is_transport());
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(
            RequestErrorKind::Status { code: 503 }.to_string(),
            "server returned status 503"
        );
        assert_eq!(RequestErrorKind::Timeout.to_string(), "request timed out");
    }
}
