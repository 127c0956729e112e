//! Error types for the transport layer
//!
//! Only hard failures live here:
//! - Non-success HTTP status (the backend rejected the call)
//! - Network failures (no response at all)
//! - Local failures before anything was sent (bad URL, bad payload, bad config)
//!
//! Application-level error codes inside a successful response are *soft*
//! errors. They are reported through the notifier and never become a
//! `TransportError`.

use std::path::PathBuf;

/// Message used when the backend gives no usable error text
pub const FALLBACK_MESSAGE: &str = "request failed";

/// Errors raised by a [`Transport`](crate::Transport) call
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Backend answered with a non-success status
    #[error("{message} (status {status})")]
    Status {
        /// HTTP status code
        status: u16,
        /// Backend-provided message or the generic fallback
        message: String,
    },

    /// Connection, TLS or body read failure
    #[error("network error: {0}")]
    Network(String),

    /// Base URL and path did not form a valid URL
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl {
        /// URL as joined
        url: String,
        /// Parser complaint
        reason: String,
    },

    /// Request payload could not be serialized
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    /// Create status error, falling back to the generic message when blank
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        };
        Self::Status { status, message }
    }

    /// Create invalid URL error
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// HTTP status carried by this error, if any
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request reached the backend and was rejected
    #[inline]
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Whether retrying the same request could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Human-readable message suitable for an operator notice
    #[must_use]
    pub fn operator_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = TransportError::status(404, "task not found");
        assert_eq!(err.to_string(), "task not found (status 404)");
        assert_eq!(err.operator_message(), "task not found");
    }

    #[test]
    fn blank_status_message_uses_fallback() {
        let err = TransportError::status(500, "   ");
        assert_eq!(err.operator_message(), FALLBACK_MESSAGE);
    }

    #[test]
    fn retryable_classification() {
        assert!(TransportError::Network("reset".into()).is_retryable());
        assert!(TransportError::status(502, "bad gateway").is_retryable());
        assert!(!TransportError::status(401, "unauthorized").is_retryable());
        assert!(!TransportError::Config("bad".into()).is_retryable());
    }

    #[test]
    fn status_code_accessor() {
        assert_eq!(TransportError::status(403, "x").status_code(), Some(403));
        assert_eq!(TransportError::Network("x".into()).status_code(), None);
        assert!(TransportError::status(403, "x").is_rejected());
    }
}
