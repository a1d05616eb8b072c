//! Error types for the DDNS client
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

use crate::types::RecordType;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS client
#[derive(Error, Debug)]
pub enum Error {
    /// Address discovery failed for a family
    #[error("Observation error: {0}")]
    Observation(String),

    /// Fetching the provider's records failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Writing one record failed
    #[error("Write error ({record_type}): {message}")]
    Write {
        /// Record type of the failed job
        record_type: RecordType,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Record or domain not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider rejected a write because the record already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

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
    /// Create an observation error
    pub fn observation(msg: impl Into<String>) -> Self {
        Self::Observation(msg.into())
    }

    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a write error for a record type
    pub fn write(record_type: RecordType, msg: impl Into<String>) -> Self {
        Self::Write {
            record_type,
            message: msg.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status to the matching error variant
    ///
    /// `context` describes the request ("Record lookup", "Record create", ...)
    /// and `body` is the provider's error payload, if it could be read.
    pub fn from_status(provider: &str, context: &str, status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::auth(format!(
                "Invalid API key or insufficient permissions. Status: {}",
                status
            )),
            404 => Self::not_found(format!("{}: {}", context, body)),
            409 => Self::conflict(format!("{}: {}", context, body)),
            429 => Self::rate_limited(format!(
                "Rate limit exceeded. Please retry later. Status: {}",
                status
            )),
            500..=599 => Self::provider(
                provider,
                format!("Server error (transient): {} - {}", status, body),
            ),
            _ => Self::provider(provider, format!("{} failed: {} - {}", context, status, body)),
        }
    }
}
