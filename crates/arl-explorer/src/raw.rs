//! Direct requests against any backend path

use crate::error::{ExplorerError, ExplorerResult};
use arl_transport::{ApiContext, Notice, QueryParams, Transport};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Method of a direct request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawMethod {
    /// Query-only call
    Get,
    /// JSON body call
    Post,
}

impl FromStr for RawMethod {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(ExplorerError::validation(format!(
                "unsupported method '{other}', expected GET or POST"
            ))),
        }
    }
}

impl fmt::Display for RawMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// One direct request as typed by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    /// Call method
    pub method: RawMethod,
    /// Path under the API base, e.g. `task/`
    pub path: String,
    /// JSON text for POST; blank means `{}`
    pub body: String,
}

impl RawRequest {
    /// GET request
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self {
            method: RawMethod::Get,
            path: path.trim().to_string(),
            body: String::new(),
        }
    }

    /// POST request with JSON text
    #[must_use]
    pub fn post(path: &str, body: &str) -> Self {
        Self {
            method: RawMethod::Post,
            path: path.trim().to_string(),
            body: body.to_string(),
        }
    }

    fn payload(&self) -> ExplorerResult<Value> {
        let text = self.body.trim();
        if text.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(text)
            .map_err(|e| ExplorerError::validation(format!("invalid JSON body: {e}")))
    }
}

/// Send a direct request and return the raw response body
///
/// A blank path is rejected with an error notice. A malformed POST body is
/// returned as a validation error without a notice. Success sends
/// "Request completed."
pub async fn send_raw(
    ctx: &ApiContext,
    transport: &dyn Transport,
    request: &RawRequest,
) -> ExplorerResult<Value> {
    if request.path.is_empty() {
        let err = ExplorerError::validation("path must not be empty");
        ctx.notify(Notice::error(err.operator_message()));
        return Err(err);
    }

    info!(method = %request.method, path = %request.path, "sending direct request");
    let body = match request.method {
        RawMethod::Get => transport.get(&request.path, &QueryParams::new()).await?,
        RawMethod::Post => transport.post(&request.path, &request.payload()?).await?,
    };
    ctx.notify(Notice::success("Request completed."));
    Ok(body)
}
