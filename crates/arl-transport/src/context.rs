//! Explicit runtime context handed to every component
//!
//! Holds the connection settings and the notification sink. Components
//! receive it by value (it is cheap to clone) instead of reading shared
//! global state.

use crate::config::ApiConfig;
use std::fmt;
use std::sync::Arc;

/// Severity of an operator notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    /// Neutral information
    Info,
    /// An operation completed
    Success,
    /// Something failed
    Error,
}

/// Operator-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub tone: Tone,
    /// Message text
    pub message: String,
}

impl Notice {
    /// Info notice
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Info,
            message: message.into(),
        }
    }

    /// Success notice
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            message: message.into(),
        }
    }

    /// Error notice
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.tone, self.message)
    }
}

/// Sink for operator notifications
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Deliver a notice; must not block
    fn notify(&self, notice: Notice);
}

/// Notifier that forwards notices to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.tone {
            Tone::Error => tracing::error!(target: "arl::notice", "{}", notice.message),
            Tone::Success | Tone::Info => {
                tracing::info!(target: "arl::notice", "{}", notice.message);
            }
        }
    }
}

/// Configuration plus notification sink
#[derive(Clone)]
pub struct ApiContext {
    config: Arc<ApiConfig>,
    notifier: Arc<dyn Notifier>,
}

impl ApiContext {
    /// Context with the tracing notifier
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self::with_notifier(config, Arc::new(TracingNotifier))
    }

    /// Context with a custom notifier
    #[must_use]
    pub fn with_notifier(config: ApiConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config: Arc::new(config),
            notifier,
        }
    }

    /// Connection settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Notification sink
    #[inline]
    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Send a notice through the sink
    #[inline]
    pub fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }
}

impl Default for ApiContext {
    fn default() -> Self {
        Self::new(ApiConfig::default())
    }
}

impl fmt::Debug for ApiContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiContext")
            .field("base_url", &self.config.base_url)
            .field("has_token", &self.config.token.is_some())
            .finish_non_exhaustive()
    }
}
