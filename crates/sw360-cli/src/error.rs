//! Error types for the SW360 utilities.

use thiserror::Error;

/// Main error type for SW360 operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing credentials, malformed env file, bad host URL)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport errors (connect, DNS, timeout); URLs are redacted
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status where the caller asked to see it
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// A field the operation depends on is absent from a response
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// No API client record matched the requested target
    #[error("No match: {0}")]
    NoMatch(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for SW360 operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(crate::api::sanitize_reqwest_error(&value))
    }
}
