//! HTTP adapters over reqwest.
//!
//! This module provides:
//! - The request executor that attaches bearer credentials and classifies
//!   outcomes
//! - The refresh transport speaking the issuer's refresh/revoke endpoints

mod executor;
mod refresh;

pub use executor::ReqwestRequestExecutor;
pub use refresh::HttpRefreshTransport;

/// Errors raised while constructing the HTTP adapters.
#[derive(Debug, thiserror::Error)]
pub enum HttpAdapterError {
    /// The underlying HTTP client could not be built.
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// An endpoint path could not be resolved against the base URL.
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}
