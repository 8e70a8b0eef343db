//! Error types for the Anthropic API client

use thiserror::Error;

/// Errors that can occur when interacting with the Anthropic API
#[derive(Debug, Error)]
pub enum ClaudeError {
    /// Missing `ANTHROPIC_API_KEY` environment variable
    #[error("Missing ANTHROPIC_API_KEY environment variable")]
    MissingApiKey,

    /// HTTP client could not be constructed
    #[error("Client setup failed: {0}")]
    ClientSetup(String),

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Rate limited - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Unauthorized - invalid API key
    #[error("Unauthorized - invalid API key")]
    Unauthorized,

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// Stream processing failed
    #[error("Stream failed: {0}")]
    StreamFailed(String),
}

impl ClaudeError {
    pub(crate) fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::RequestFailed(error.to_string())
        }
    }

    /// Whether the request may succeed if retried
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::Timeout | Self::RateLimited | Self::StreamFailed(_) => {
                true
            }
            Self::ApiError { status, .. } => *status >= 500,
            Self::MissingApiKey
            | Self::ClientSetup(_)
            | Self::ResponseParseFailed(_)
            | Self::Unauthorized => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ClaudeError::RateLimited.is_transient());
        assert!(ClaudeError::Timeout.is_transient());
        assert!(ClaudeError::ApiError {
            status: 529,
            message: "overloaded".to_string()
        }
        .is_transient());
        assert!(!ClaudeError::ApiError {
            status: 400,
            message: "bad request".to_string()
        }
        .is_transient());
        assert!(!ClaudeError::Unauthorized.is_transient());
    }
}
