//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Default path of the refresh endpoint, relative to the base URL.
pub const DEFAULT_REFRESH_PATH: &str = "auth/refresh";
/// Default path of the revoke (logout) endpoint, relative to the base URL.
pub const DEFAULT_REVOKE_PATH: &str = "auth/logout";
/// Default per-request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Default bound on a refresh exchange in milliseconds.
pub const DEFAULT_REFRESH_TIMEOUT_MS: u64 = 15_000;

/// Configuration shared by the pipeline and its adapters.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Base URL all request paths are resolved against.
    pub base_url: Url,
    /// Refresh endpoint path, relative to `base_url`.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Revoke endpoint path, relative to `base_url`.
    #[serde(default = "default_revoke_path")]
    pub revoke_path: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Bound on a refresh exchange in milliseconds. A refresh that exceeds
    /// it is a refresh failure, never an indefinite hang.
    #[serde(default = "default_refresh_timeout_ms")]
    pub refresh_timeout_ms: u64,
    /// Override for the persisted session file location.
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_string()
}

fn default_revoke_path() -> String {
    DEFAULT_REVOKE_PATH.to_string()
}

const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

const fn default_refresh_timeout_ms() -> u64 {
    DEFAULT_REFRESH_TIMEOUT_MS
}

impl PipelineConfig {
    /// Creates a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            refresh_path: default_refresh_path(),
            revoke_path: default_revoke_path(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            refresh_timeout_ms: DEFAULT_REFRESH_TIMEOUT_MS,
            session_file: None,
        }
    }

    /// Overrides the persisted session file location.
    #[must_use]
    pub fn with_session_file(mut self, path: PathBuf) -> Self {
        self.session_file = Some(path);
        self
    }

    /// Overrides the refresh exchange bound.
    #[must_use]
    pub const fn with_refresh_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.refresh_timeout_ms = timeout_ms;
        self
    }

    /// The per-request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The refresh bound as a [`Duration`].
    #[must_use]
    pub const fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new(Url::parse("https://api.example.com/").unwrap());
        assert_eq!(config.refresh_path, "auth/refresh");
        assert_eq!(config.revoke_path, "auth/logout");
        assert_eq!(config.refresh_timeout(), Duration::from_secs(15));
        assert!(config.session_file.is_none());
    }

    #[test]
    fn test_deserialization_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"base_url": "https://api.example.com/"}"#).unwrap();
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.refresh_path, "auth/refresh");
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::new(Url::parse("https://api.example.com/").unwrap())
            .with_refresh_timeout_ms(500)
            .with_session_file(PathBuf::from("/tmp/session.json"));
        assert_eq!(config.refresh_timeout(), Duration::from_millis(500));
        assert_eq!(config.session_file, Some(PathBuf::from("/tmp/session.json")));
    }
}
