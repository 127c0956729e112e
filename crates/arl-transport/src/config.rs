//! Runtime configuration for talking to the backend

use crate::error::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Base URL used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5003/api";

/// Header carrying the credential
pub const DEFAULT_TOKEN_HEADER: &str = "Token";

/// Environment variable the console reads the API base from
pub const ENV_API_BASE: &str = "ARL_API_BASE";

/// Environment variable carrying the credential
pub const ENV_TOKEN: &str = "ARL_TOKEN";

/// Connection settings shared by every component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL; paths are joined onto it
    pub base_url: String,
    /// Credential attached to every request when present
    pub token: Option<String>,
    /// Header name the credential is sent in
    pub token_header: String,
}

impl ApiConfig {
    /// Create configuration for a base URL
    #[inline]
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base(base_url.into()),
            ..Self::default()
        }
    }

    /// With base URL; a blank URL restores the default
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base(base_url.into());
        self
    }

    /// With credential; a blank token clears it
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.trim().is_empty() {
            None
        } else {
            Some(token.trim().to_string())
        };
        self
    }

    /// With credential header name
    #[inline]
    #[must_use]
    pub fn with_token_header(mut self, header: impl Into<String>) -> Self {
        self.token_header = header.into();
        self
    }

    /// Parse a TOML document
    ///
    /// Recognized keys: `api_base`, `token`, `token_header`. All optional.
    pub fn from_toml_str(source: &str) -> TransportResult<Self> {
        let file: ConfigFile =
            toml::from_str(source).map_err(|e| TransportError::Config(e.to_string()))?;
        let mut config = Self::default();
        if let Some(base) = file.api_base {
            config.base_url = normalize_base(base);
        }
        if let Some(token) = file.token {
            config = config.with_token(token);
        }
        if let Some(header) = file.token_header {
            if header.trim().is_empty() {
                return Err(TransportError::Config("token_header must not be empty".into()));
            }
            config.token_header = header;
        }
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> TransportResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| TransportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            token: None,
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_base: Option<String>,
    token: Option<String>,
    token_header: Option<String>,
}

fn normalize_base(base: String) -> String {
    let trimmed = base.trim();
    if trimmed.is_empty() {
        DEFAULT_API_BASE.to_string()
    } else {
        trimmed.to_string()
    }
}
