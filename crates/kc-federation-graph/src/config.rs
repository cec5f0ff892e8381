//! Graph API client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

/// Production Graph API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "GRAPH_API_URL";

/// Environment variable overriding the request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "GRAPH_API_TIMEOUT_SECS";

/// Configuration for [`crate::GraphApiClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Maximum number of pages followed for one group listing.
    pub max_pages: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_pages: 20,
        }
    }
}

impl GraphConfig {
    /// Builds a configuration from the environment, falling back to defaults.
    ///
    /// Blank, unparsable or zero values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(url);
        }

        if let Some(secs) = lookup(TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            config.timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Sets the base URL. A trailing slash is removed.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the page bound for group listings.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Validates the configuration.
    ///
    /// ## Errors
    ///
    /// Returns [`GraphError::Configuration`] if the base URL is not HTTP(S)
    /// or the page bound is zero.
    pub fn validate(&self) -> GraphResult<()> {
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(GraphError::config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(GraphError::config("timeout must be greater than zero"));
        }
        if self.max_pages == 0 {
            return Err(GraphError::config("max_pages must be at least 1"));
        }
        Ok(())
    }

    /// True if `url` points at or below the base URL.
    #[must_use]
    pub fn is_within_base(&self, url: &str) -> bool {
        url.strip_prefix(self.base_url.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Joins a relative path onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
