// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the submission client.

use std::fmt;

/// Error returned by the word-collection service client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The word was empty once markup and whitespace were stripped
    EmptyAfterCleanup,

    /// The request could not be sent or the response could not be read
    Transport(String),

    /// The service answered but did not report success
    Server {
        /// HTTP status, when the failure was visible at the HTTP level
        status: Option<u16>,
        /// Message reported by the service
        message: String,
    },

    /// The response body was not the expected JSON document
    InvalidResponse(String),
}

impl ClientError {
    /// Creates a server error from a reply without an HTTP status.
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            status: None,
            message: message.into(),
        }
    }

    /// Returns `true` if a further attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ClientError::EmptyAfterCleanup)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::EmptyAfterCleanup => write!(f, "Word is empty after cleaning"),
            ClientError::Transport(reason) => write!(f, "Network error: {}", reason),
            ClientError::Server { status, message } => {
                write!(f, "Server error")?;
                if let Some(code) = status {
                    write!(f, " (HTTP {})", code)?;
                }
                write!(f, ": {}", message)
            }
            ClientError::InvalidResponse(reason) => write!(f, "Invalid response: {}", reason),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test 1: Display distinguishes transport and server failures
    #[test]
    fn test_display() {
        assert_eq!(
            ClientError::Transport("connection refused".into()).to_string(),
            "Network error: connection refused"
        );
        assert_eq!(
            ClientError::Server {
                status: Some(503),
                message: "busy".into()
            }
            .to_string(),
            "Server error (HTTP 503): busy"
        );
        assert_eq!(ClientError::server("nope").to_string(), "Server error: nope");
    }

    /// Test 2: Classification helpers
    #[test]
    fn test_classification() {
        assert!(ClientError::Transport(String::new()).is_retryable());
        assert!(ClientError::server("x").is_retryable());
        assert!(!ClientError::EmptyAfterCleanup.is_retryable());
    }
}
