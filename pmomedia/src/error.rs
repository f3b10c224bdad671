//! Error types for media source resolution

/// Result type alias for media source operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving media URLs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Resolution took longer than the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Resolution was cancelled through its cancellation token
    #[error("Resolution aborted")]
    Aborted,

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No source registered under the requested identifier
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Source exists but cannot serve right now
    #[error("Source not available: {0}")]
    SourceUnavailable(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
