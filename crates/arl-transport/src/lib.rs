//! ARL Transport
//!
//! The leaf of the console core: issues HTTP calls against the ARL
//! backend, attaches the credential, decodes bodies and classifies
//! failures.
//!
//! # Failure model
//!
//! - **Transport error**: non-success status, surfaced as
//!   `Err(TransportError::Status)`
//! - **Soft error**: success status with an embedded `code`, reported to
//!   the [`Notifier`] while the body is still returned
//!
//! # Example
//!
//! ```rust,ignore
//! use arl_transport::prelude::*;
//!
//! # async fn example() -> Result<(), TransportError> {
//! let ctx = ApiContext::new(ApiConfig::new("http://10.0.0.5:5003/api").with_token("s3cret"));
//! let transport = HttpTransport::new(ctx);
//!
//! let params = QueryParams::new().with("page", 1).with("size", 10);
//! let body = transport.get("domain/", &params).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod body;
pub mod config;
pub mod context;
pub mod error;
pub mod query;
pub mod transport;

pub use body::{is_truthy, parse_body, soft_error_message};
pub use config::ApiConfig;
pub use context::{ApiContext, Notice, Notifier, Tone, TracingNotifier};
pub use error::{TransportError, TransportResult};
pub use query::{join_url, QueryParams};
pub use transport::{HttpTransport, RequestOptions, Transport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the transport
    pub use crate::config::ApiConfig;
    pub use crate::context::{ApiContext, Notice, Notifier, Tone};
    pub use crate::error::{TransportError, TransportResult};
    pub use crate::query::QueryParams;
    pub use crate::transport::{HttpTransport, RequestOptions, Transport};
}
