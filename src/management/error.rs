//! Error types for the management REST client.

use thiserror::Error;

use crate::config::ConfigError;
use crate::payload::PayloadError;

/// Errors raised by [`super::ManagementClient`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ClientError {
    /// Raised when the configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the configured endpoint cannot address API resources.
    #[error("invalid management endpoint `{endpoint}`: {message}")]
    Endpoint {
        /// Endpoint as configured.
        endpoint: String,
        /// Reason the endpoint was rejected.
        message: String,
    },
    /// Raised when the request never produced a response.
    #[error("{method} {url} failed: {message}")]
    Transport {
        /// HTTP method.
        method: String,
        /// Request URL.
        url: String,
        /// Message from the HTTP client.
        message: String,
    },
    /// Raised when the service answers with a non-success status.
    #[error("{method} {url} returned {status}: {message}")]
    Status {
        /// HTTP method.
        method: String,
        /// Request URL.
        url: String,
        /// Numeric status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },
    /// Raised when a response body does not match the expected shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Request URL.
        url: String,
        /// Deserialiser message.
        message: String,
    },
    /// Raised when the web job file cannot be read.
    #[error("failed to read job file: {0}")]
    JobFile(#[from] PayloadError),
}

impl ClientError {
    /// Reports whether the service answered `404 Not Found`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

impl From<ConfigError> for ClientError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
