//! Error types for the GKE cleaner

use thiserror::Error;

/// Main error type for cleaner operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Missing or invalid startup configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A cluster store statement failed
    #[error("store error: failed to {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// GKE API call failed (network, HTTP status or payload)
    #[error("remote cluster API error: {0}")]
    Remote(String),

    /// Cleanup could not resolve where an expired cluster lives
    #[error("couldn't find cluster in remote inventory: {0}")]
    LocationNotFound(String),

    /// Service account key or token exchange failure
    #[error("credentials error: {0}")]
    Credentials(String),
}

impl Error {
    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a remote API error with the given message
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Create a credentials error with the given message
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    /// Adapter for `map_err` that tags a sqlx failure with the statement it came from
    pub fn store(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Store { operation, source }
    }

    /// Whether this error came from the cluster store
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(err.to_string())
    }
}

/// Result alias used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;
