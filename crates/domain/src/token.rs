//! Token pair carried by an authenticated session.

use serde::{Deserialize, Serialize};

/// An access/refresh token pair.
///
/// The access token is attached to every outgoing authenticated request.
/// The refresh token, when present, is the only credential that can obtain
/// a new pair once the access token is rejected.
///
/// Serialized form uses the fixed storage keys `auth_token` and
/// `refresh_token`, which is also the shape of the persisted session file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived credential presented as `Authorization: Bearer <token>`.
    #[serde(rename = "auth_token")]
    pub access_token: String,

    /// Longer-lived credential used solely to obtain a new pair.
    #[serde(rename = "refresh_token", default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    /// Creates a pair with both tokens.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Creates a pair that cannot be refreshed.
    #[must_use]
    pub fn access_only(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
        }
    }

    /// Builds the successor pair after a completed refresh.
    ///
    /// A refresh response that omits a new refresh token means the old one
    /// stays valid and is carried over unchanged.
    #[must_use]
    pub fn rotated(&self, access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token: refresh_token.or_else(|| self.refresh_token.clone()),
        }
    }

    /// Returns true if this pair carries a refresh token.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Returns true if both pairs carry the same access token.
    ///
    /// Used by the refresh coordinator to decide whether an observed stale
    /// pair is still the committed one.
    #[must_use]
    pub fn same_access_token(&self, other: &Self) -> bool {
        self.access_token == other.access_token
    }

    /// Returns the `Authorization` header value for this pair.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Returns a preview of the access token safe for logs (first 8 chars).
    #[must_use]
    pub fn access_token_preview(&self) -> String {
        preview(&self.access_token)
    }
}

// Tokens are credentials; Debug must not leak them into logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &preview(&self.access_token))
            .field("refresh_token", &self.refresh_token.as_deref().map(preview))
            .finish()
    }
}

fn preview(token: &str) -> String {
    if token.len() > 12 {
        format!("{}...", &token[..8])
    } else {
        token.to_string()
    }
}
