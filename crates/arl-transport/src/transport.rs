//! Transport contract and its reqwest-backed implementation
//!
//! Failure classification:
//! - non-success status → `Err(TransportError::Status)`, error notice unless silent
//! - success status with an embedded error `code` → `Ok(body)`, error notice
//!   unless silent (callers can still inspect the partial payload)

use crate::body::{failure_message, parse_body, soft_error_message};
use crate::context::{ApiContext, Notice};
use crate::error::{TransportError, TransportResult};
use crate::query::{join_url, QueryParams};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use url::Url;

/// Per-call options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Suppress operator notices for this call
    pub silent: bool,
}

impl RequestOptions {
    /// Options for best-effort calls that must not raise notices
    #[inline]
    #[must_use]
    pub const fn silent() -> Self {
        Self { silent: true }
    }
}

/// Asynchronous access to the backend
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` with query parameters
    async fn get_with(
        &self,
        path: &str,
        params: &QueryParams,
        options: RequestOptions,
    ) -> TransportResult<Value>;

    /// POST a JSON payload to `path`
    async fn post_with(
        &self,
        path: &str,
        payload: &Value,
        options: RequestOptions,
    ) -> TransportResult<Value>;

    /// GET with default options
    async fn get(&self, path: &str, params: &QueryParams) -> TransportResult<Value> {
        self.get_with(path, params, RequestOptions::default()).await
    }

    /// POST with default options
    async fn post(&self, path: &str, payload: &Value) -> TransportResult<Value> {
        self.post_with(path, payload, RequestOptions::default()).await
    }
}

/// HTTP transport over `reqwest`
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    ctx: ApiContext,
}

impl HttpTransport {
    /// Transport with a fresh client
    #[must_use]
    pub fn new(ctx: ApiContext) -> Self {
        Self::with_client(reqwest::Client::new(), ctx)
    }

    /// Transport reusing an existing client
    #[must_use]
    pub fn with_client(client: reqwest::Client, ctx: ApiContext) -> Self {
        Self { client, ctx }
    }

    /// Context this transport reports through
    #[inline]
    #[must_use]
    pub fn context(&self) -> &ApiContext {
        &self.ctx
    }

    /// Full URL for a path and parameters
    pub fn url_for(&self, path: &str, params: &QueryParams) -> TransportResult<Url> {
        let joined = join_url(&self.ctx.config().base_url, path);
        let query = params.to_query_string();
        let full = if query.is_empty() {
            joined
        } else {
            format!("{joined}?{query}")
        };
        Url::parse(&full).map_err(|e| TransportError::invalid_url(full, e))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let config = self.ctx.config();
        match &config.token {
            Some(token) => request.header(config.token_header.as_str(), token.as_str()),
            None => request,
        }
    }

    async fn execute(
        &self,
        method: &'static str,
        url: Url,
        request: reqwest::RequestBuilder,
        options: RequestOptions,
    ) -> TransportResult<Value> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = parse_body(&text);

        tracing::debug!(method, url = %url, status = status.as_u16(), "request settled");

        if !status.is_success() {
            let message = failure_message(&body);
            if !options.silent {
                self.ctx.notify(Notice::error(message.clone()));
            }
            return Err(TransportError::status(status.as_u16(), message));
        }

        if let Some(message) = soft_error_message(&body) {
            tracing::warn!(method, url = %url, %message, "backend reported an error code");
            if !options.silent {
                self.ctx.notify(Notice::error(message));
            }
        }

        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_with(
        &self,
        path: &str,
        params: &QueryParams,
        options: RequestOptions,
    ) -> TransportResult<Value> {
        let url = self.url_for(path, params)?;
        let request = self.client.get(url.clone());
        self.execute("GET", url, request, options).await
    }

    async fn post_with(
        &self,
        path: &str,
        payload: &Value,
        options: RequestOptions,
    ) -> TransportResult<Value> {
        let url = self.url_for(path, &QueryParams::new())?;
        let body = serde_json::to_vec(payload)?;
        let request = self
            .client
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        self.execute("POST", url, request, options).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get_with(
        &self,
        path: &str,
        params: &QueryParams,
        options: RequestOptions,
    ) -> TransportResult<Value> {
        (**self).get_with(path, params, options).await
    }

    async fn post_with(
        &self,
        path: &str,
        payload: &Value,
        options: RequestOptions,
    ) -> TransportResult<Value> {
        (**self).post_with(path, payload, options).await
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}
