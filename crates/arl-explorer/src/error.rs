//! Error types for result exploration

use arl_transport::TransportError;

/// Errors surfaced by views, actions and submissions
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    /// Backend call failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Input rejected before any network call
    #[error("validation failed: {0}")]
    Validation(String),

    /// Resource name not in the catalog
    #[error("unknown resource: '{0}'")]
    UnknownResource(String),

    /// Row action could not run
    #[error("action '{label}' failed: {message}")]
    Action {
        /// Action label
        label: String,
        /// Failure text
        message: String,
    },

    /// Row or action index out of range
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
}

impl ExplorerError {
    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create action error
    pub fn action(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Action {
            label: label.into(),
            message: message.into(),
        }
    }

    /// Check if the error was raised before reaching the backend
    #[must_use]
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Transport(_))
    }

    /// Short message suitable for a notice
    #[must_use]
    pub fn operator_message(&self) -> String {
        match self {
            Self::Transport(err) => err.operator_message(),
            Self::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result alias for explorer operations
pub type ExplorerResult<T> = Result<T, ExplorerError>;
