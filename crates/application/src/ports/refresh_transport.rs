//! Refresh transport port
//!
//! Defines the interface to the token issuer's refresh and revoke
//! endpoints. Implementations perform exactly one network call per
//! invocation; de-duplication is the coordinator's job.

use async_trait::async_trait;
use tollgate_domain::RefreshError;

/// Raw result of a successful refresh exchange, before the new pair is
/// merged with the old one.
///
/// An absent refresh token means the issuer did not rotate it and the
/// previous one remains valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    /// The newly issued access token.
    pub access_token: String,
    /// The newly issued refresh token, if the issuer rotated it.
    pub refresh_token: Option<String>,
}

/// Talks to the token issuer.
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    /// Exchanges a refresh token for a new token set.
    ///
    /// # Errors
    /// Returns a [`RefreshError`] when the issuer rejects the token, the
    /// response carries no usable access token, or the call fails at the
    /// transport level. Implementations must not retry.
    async fn exchange(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError>;

    /// Invalidates a refresh token at the issuer.
    ///
    /// Used by logout; callers treat failures as non-fatal.
    ///
    /// # Errors
    /// Returns a [`RefreshError`] when the revoke call fails.
    async fn revoke(&self, refresh_token: &str) -> Result<(), RefreshError>;
}
