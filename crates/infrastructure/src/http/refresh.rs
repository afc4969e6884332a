//! Refresh transport implementation speaking the issuer's JSON envelope.
//!
//! Wire contract: `POST {base}/auth/refresh` with `{"refreshToken": ...}`;
//! a success response carries `{"accessToken": ..., "refreshToken": ...}`
//! where the refresh token is optional (omission means it was not rotated).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tollgate_application::PipelineConfig;
use tollgate_application::ports::{RefreshTransport, RefreshedTokens};
use tollgate_domain::RefreshError;
use tracing::debug;
use url::Url;

use super::HttpAdapterError;

/// Request body for the refresh and revoke endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Response body of a successful refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Refresh transport backed by `reqwest::Client`.
pub struct HttpRefreshTransport {
    client: Client,
    refresh_url: Url,
    revoke_url: Url,
}

impl HttpRefreshTransport {
    /// Creates a transport for the configured refresh/revoke endpoints.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or an endpoint
    /// path does not resolve against the base URL.
    pub fn new(config: &PipelineConfig) -> Result<Self, HttpAdapterError> {
        let client = Client::builder()
            .user_agent(concat!("Tollgate/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            refresh_url: config.base_url.join(&config.refresh_path)?,
            revoke_url: config.base_url.join(&config.revoke_path)?,
        })
    }

    fn transport_error(error: &reqwest::Error) -> RefreshError {
        RefreshError::Transport {
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl RefreshTransport for HttpRefreshTransport {
    async fn exchange(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
        debug!("exchanging refresh token");
        let response = self
            .client
            .post(self.refresh_url.clone())
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|error| Self::transport_error(&error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
            });
        }

        // A success status with no usable access token is still a failure.
        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|_| RefreshError::MalformedResponse)?;

        match body.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(RefreshedTokens {
                access_token,
                refresh_token: body.refresh_token,
            }),
            _ => Err(RefreshError::MalformedResponse),
        }
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), RefreshError> {
        let response = self
            .client
            .post(self.revoke_url.clone())
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|error| Self::transport_error(&error))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RefreshError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
