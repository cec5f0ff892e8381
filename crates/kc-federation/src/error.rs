//! Federation error types.
//!
//! None of these errors is fatal to a login: mapper hooks catch them,
//! log them and report the mapper as skipped.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while running broker mappers.
#[derive(Debug, Error)]
pub enum FederationError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Required mapper configuration entry is missing.
    #[error("Missing mapper configuration: {0}")]
    MissingConfig(String),

    /// Connection error to the remote directory.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Remote directory answered with an unexpected status.
    #[error("Remote directory error: {0}")]
    Remote(String),

    /// Remote or cached payload could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Local group referenced by id does not exist.
    #[error("Group not found: {0}")]
    GroupNotFound(Uuid),

    /// Local group hierarchy loops back on itself.
    #[error("Group hierarchy cycle detected at group {0}")]
    GroupCycle(Uuid),

    /// Timeout error.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Storage error when reading or writing local state.
    #[error("Storage error: {0}")]
    Storage(#[from] kc_storage::StorageError),
}

impl FederationError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a missing configuration error.
    #[must_use]
    pub fn missing_config(key: impl Into<String>) -> Self {
        Self::MissingConfig(key.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Creates a remote directory error.
    #[must_use]
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Checks if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::MissingConfig(_))
    }

    /// Checks if this is a connection error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }

    /// Checks if this error comes from the local group hierarchy.
    #[must_use]
    pub const fn is_hierarchy_error(&self) -> bool {
        matches!(self, Self::GroupNotFound(_) | Self::GroupCycle(_))
    }
}

/// Result type for federation operations.
pub type FederationResult<T> = Result<T, FederationError>;
