//! Request executor implementation using reqwest.
//!
//! This adapter issues one attempt per call and classifies the result.
//! HTTP 401 is the only status that maps to `Unauthenticated`; a 403 is a
//! permission problem, not a session signal, and stays in `OtherError`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method};
use tollgate_application::PipelineConfig;
use tollgate_application::ports::RequestExecutor;
use tollgate_domain::{
    ExecuteOutcome, HttpMethod, RequestDescriptor, RequestErrorKind, ResponsePayload,
};
use tracing::debug;
use url::Url;

use super::HttpAdapterError;

/// The one status code that signals a rejected access token.
const UNAUTHENTICATED_STATUS: u16 = 401;

/// Request executor backed by `reqwest::Client`.
pub struct ReqwestRequestExecutor {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestRequestExecutor {
    /// Creates an executor for the configured base URL.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &PipelineConfig) -> Result<Self, HttpAdapterError> {
        let client = Client::builder()
            .user_agent(concat!("Tollgate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            timeout: config.request_timeout(),
        })
    }

    /// Creates an executor with a caller-supplied reqwest client.
    #[must_use]
    pub fn with_client(client: Client, config: &PipelineConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            timeout: config.request_timeout(),
        }
    }

    /// Converts the domain method to a reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Maps a reqwest error to a request-local error kind.
    fn map_error(error: &reqwest::Error) -> RequestErrorKind {
        if error.is_timeout() {
            return RequestErrorKind::Timeout;
        }
        if error.is_connect() {
            let message = error.to_string().to_lowercase();
            if message.contains("dns") || message.contains("resolve") {
                return RequestErrorKind::DnsError;
            }
            if message.contains("refused") {
                return RequestErrorKind::ConnectionRefused;
            }
            if message.contains("certificate") || message.contains("tls") {
                return RequestErrorKind::TlsError;
            }
            return RequestErrorKind::ConnectionFailed;
        }
        if error.is_body() || error.is_builder() {
            return RequestErrorKind::InvalidBody;
        }
        RequestErrorKind::Unknown
    }
}

#[async_trait]
impl RequestExecutor for ReqwestRequestExecutor {
    async fn execute(
        &self,
        request: &RequestDescriptor,
        access_token: Option<&str>,
    ) -> ExecuteOutcome {
        let Ok(url) = self.base_url.join(&request.path) else {
            return ExecuteOutcome::OtherError(RequestErrorKind::InvalidUrl);
        };

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(self.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(token) = access_token {
            builder = builder.header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(error) => {
                debug!(request_id = %request.id, %error, "request attempt failed in transport");
                return ExecuteOutcome::OtherError(Self::map_error(&error));
            }
        };

        let status = response.status().as_u16();
        if status == UNAUTHENTICATED_STATUS {
            debug!(request_id = %request.id, "access token rejected");
            return ExecuteOutcome::Unauthenticated;
        }

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<binary>").to_string(),
                )
            })
            .collect();

        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(error) => {
                debug!(request_id = %request.id, %error, "failed to read response body");
                return ExecuteOutcome::OtherError(Self::map_error(&error));
            }
        };

        let payload = ResponsePayload::new(status, headers, body, start.elapsed());
        if payload.is_success() {
            ExecuteOutcome::Success(payload)
        } else {
            ExecuteOutcome::OtherError(RequestErrorKind::Status { code: status })
        }
    }
}
