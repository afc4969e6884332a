//! Session state machine.
//!
//! Exactly one state is active per pipeline instance at any instant.
//! Transitions are driven only by executor outcomes and refresh results,
//! never by collaborators directly.

use serde::{Deserialize, Serialize};

use crate::token::TokenPair;

/// The lifecycle state of a logical user session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No credentials; requests go out unauthenticated.
    #[default]
    Anonymous,
    /// A committed token pair is in use.
    Authenticated {
        /// The pair currently attached to outgoing requests.
        pair: TokenPair,
    },
    /// A refresh is in flight for the given stale pair.
    Refreshing {
        /// The pair that was observed stale when the refresh started.
        stale: TokenPair,
    },
    /// Terminal: the session could not be renewed. Collaborators must
    /// clear cached identity and route to re-authentication.
    Expired,
}

impl SessionState {
    /// Creates the authenticated state.
    #[must_use]
    pub const fn authenticated(pair: TokenPair) -> Self {
        Self::Authenticated { pair }
    }

    /// Returns true while a committed pair is in use.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Returns true for the terminal expired state.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }

    /// Returns true while a refresh is in flight.
    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        matches!(self, Self::Refreshing { .. })
    }

    /// Returns the access token currently attached to requests, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { pair } | Self::Refreshing { stale: pair } => {
                Some(pair.access_token.as_str())
            }
            Self::Anonymous | Self::Expired => None,
        }
    }
}
