//! Graph-specific error types.
//!
//! ## Security Note
//!
//! Error messages must not carry bearer tokens or raw token payloads.

use kc_federation::FederationError;
use thiserror::Error;

/// Errors raised while talking to the remote directory.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Invalid configuration.
    #[error("Graph API configuration error: {0}")]
    Configuration(String),

    /// Connection failed.
    #[error("Graph API connection failed: {0}")]
    Connection(String),

    /// Request timed out.
    #[error("Graph API request timed out")]
    Timeout,

    /// Directory answered with a status other than 200 or 404.
    #[error("Graph API returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Response body could not be parsed.
    #[error("Graph API response could not be parsed: {0}")]
    Parse(String),

    /// Group listing paged beyond the configured bound, or to a foreign host.
    #[error("Graph API paging error: {0}")]
    Paging(String),

    /// Other transport error.
    #[error("Graph API request failed: {0}")]
    Request(String),
}

impl GraphError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Creates a paging error.
    #[must_use]
    pub fn paging(msg: impl Into<String>) -> Self {
        Self::Paging(msg.into())
    }

    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }

    /// Returns the HTTP status, if the directory answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<GraphError> for FederationError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Configuration(msg) => FederationError::config(msg),
            GraphError::Connection(msg) => FederationError::connection(msg),
            GraphError::Timeout => FederationError::Timeout("Graph API request".to_string()),
            GraphError::Status { .. } | GraphError::Paging(_) | GraphError::Request(_) => {
                FederationError::remote(err.to_string())
            }
            GraphError::Parse(msg) => FederationError::parse(msg),
        }
    }
}

/// Result type for Graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
