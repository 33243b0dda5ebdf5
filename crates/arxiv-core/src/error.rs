//! Error types for the arXiv poller
//!
//! Every failure a caller of [`PollingEngine::next()`](crate::PollingEngine::next)
//! can observe is one of these variants. "No record available yet" is not an
//! error; see [`NextRecord`](crate::NextRecord).

use thiserror::Error;

/// Result type alias for poller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the arXiv poller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The configured API base URL could not be parsed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Network failure, timeout, or unreadable response body
    #[error("Transport error: {0}")]
    Transport(String),

    /// The upstream API answered with a non-success status
    #[error("arXiv API returned status {status}: {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Response body, as received
        body: String,
    },

    /// The feed document is not well-formed or has an unexpected structure
    #[error("Malformed feed: {0}")]
    MalformedFeed(String),

    /// An entry timestamp matched none of the accepted formats
    #[error("failed to parse {field} date: {value:?}")]
    TimestampParse {
        /// Which entry field failed (`published` or `updated`)
        field: &'static str,
        /// The raw text that was rejected
        value: String,
    },

    /// The caller's cancellation signal fired while waiting for the rate limiter
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an invalid endpoint error
    pub fn invalid_endpoint(msg: impl Into<String>) -> Self {
        Self::InvalidEndpoint(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an upstream status error
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Create a malformed feed error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedFeed(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether retrying the same page later can reasonably succeed
    ///
    /// Transport failures, throttling (429) and server-side (5xx) statuses are
    /// transient. Everything else needs a configuration or upstream data fix.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
