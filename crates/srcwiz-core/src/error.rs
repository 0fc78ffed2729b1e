//! Error types for the source wizard
//!
//! This module defines all error types used throughout the crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for wizard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error body returned by the source settings API
///
/// Only `errmsg` is interpreted. Any other member is kept verbatim so that a
/// failure callback sees the payload exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable message, shown to the user as-is
    pub errmsg: String,

    /// Remaining members of the error body
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ErrorPayload {
    /// Create a payload carrying only a message
    pub fn new(errmsg: impl Into<String>) -> Self {
        Self {
            errmsg: errmsg.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Core error type for the source wizard
#[derive(Error, Debug)]
pub enum Error {
    /// The server rejected the step (validation or server-side fault)
    #[error("{}", .0.errmsg)]
    Server(ErrorPayload),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// The form provider did not answer in time
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A transition is already in flight
    #[error("A step transition is already in progress")]
    Busy,

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a server error from a bare message
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(ErrorPayload::new(msg))
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// The payload handed to failure callbacks
    ///
    /// Server errors yield the body they were decoded from; every other error
    /// is wrapped so that `errmsg` carries its display text.
    pub fn payload(&self) -> ErrorPayload {
        match self {
            Self::Server(payload) => payload.clone(),
            other => ErrorPayload::new(other.to_string()),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
