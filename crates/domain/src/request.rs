//! Request descriptor types
//!
//! A [`RequestDescriptor`] is everything the pipeline needs to issue an
//! outbound call once, and to replay it exactly once after a token refresh.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET method
    #[default]
    Get,
    /// HTTP POST method
    Post,
    /// HTTP PUT method
    Put,
    /// HTTP PATCH method
    Patch,
    /// HTTP DELETE method
    Delete,
}

impl HttpMethod {
    /// Returns the method as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Returns whether this method typically carries a request body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(DomainError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Description of one logical API request.
///
/// Created by the caller, consumed by the pipeline. The `replayed` marker is
/// the replay budget: a descriptor is replayed at most once, and only through
/// [`RequestDescriptor::into_replay`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Correlation id for logs (UUID v7, sortable by creation time).
    pub id: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the pipeline's base URL, e.g. `documents/42`.
    pub path: String,
    /// Query parameters, appended in order.
    #[serde(default)]
    pub query: Vec<(String, String)>,
    /// Extra headers, e.g. an idempotency key. `Authorization` is always
    /// owned by the pipeline and must not appear here.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Optional JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Whether this descriptor has already been replayed once.
    #[serde(default)]
    replayed: bool,
}

impl RequestDescriptor {
    /// Creates a descriptor with the given method and path.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            replayed: false,
        }
    }

    /// Creates a GET descriptor.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST descriptor with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut descriptor = Self::new(HttpMethod::Post, path);
        descriptor.body = Some(body);
        descriptor
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns true if the replay budget is spent.
    #[must_use]
    pub const fn is_replay(&self) -> bool {
        self.replayed
    }

    /// Consumes the descriptor, marking it as replayed.
    ///
    /// The id is kept so both attempts correlate in logs.
    #[must_use]
    pub fn into_replay(mut self) -> Self {
        self.replayed = true;
        self
    }
}
