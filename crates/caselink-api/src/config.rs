use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::error::{ApiError, Result};

/// Environment variable holding the backend base URL.
pub const BASE_URL_ENV: &str = "CASELINK_API_BASE_URL";
/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "CASELINK_HTTP_TIMEOUT_SECS";
/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Builds a config for `base_url` with the default timeout.
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] when the URL does not parse, is not
    /// `http`/`https`, or cannot carry a path.
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|error| ApiError::Config(format!("invalid base url: {error}")))?;

        match parsed.scheme() {
            "https" => {}
            "http" => {
                if !is_loopback(&parsed) {
                    warn!(host = parsed.host_str().unwrap_or_default(), "api base url is not https");
                }
            }
            other => {
                return Err(ApiError::Config(format!(
                    "base url scheme must be http or https, got {other}"
                )));
            }
        }

        if parsed.cannot_be_a_base() {
            return Err(ApiError::Config("base url cannot carry a path".to_string()));
        }

        Ok(Self {
            base_url: parsed,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Reads config from the process environment.
    ///
    /// # Errors
    /// See [`ApiConfig::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads config through `lookup`, which maps variable names to values.
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] when the base URL is missing or invalid, or
    /// when the timeout is not a positive integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(BASE_URL_ENV)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ApiError::Config(format!("{BASE_URL_ENV} is required")))?;
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let seconds: u64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|seconds| *seconds > 0)
                .ok_or_else(|| {
                    ApiError::Config(format!("{TIMEOUT_ENV} must be a positive integer"))
                })?;
            config.timeout = Duration::from_secs(seconds);
        }

        Ok(config)
    }

    /// Replaces the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain == "localhost",
        Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
        Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    }
}
