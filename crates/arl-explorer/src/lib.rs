//! ARL Explorer
//!
//! Generic exploration of recon results: one code path renders every
//! collection the backend exposes.
//!
//! # Pipeline
//!
//! 1. **Normalize**: any list response becomes a [`ListEnvelope`]
//! 2. **Group**: records are partitioned by parent task ([`group_by_task`])
//! 3. **Resolve**: parent task names are fetched once per id, coalesced and
//!    cached ([`TaskMetaResolver`])
//! 4. **Render**: explicit or inferred columns, escaped cells ([`Table`])
//!
//! [`ResourceView`] drives the pipeline for one screen and discards loads
//! superseded by a newer one.
//!
//! # Example
//!
//! ```rust,ignore
//! use arl_explorer::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> ExplorerResult<()> {
//! let ctx = ApiContext::new(ApiConfig::default().with_base_url("http://10.0.0.5:5003/api"));
//! let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(ctx.clone()));
//! let resolver = TaskMetaResolver::new(transport.clone());
//! let view = ResourceView::new(ctx, transport, resolver);
//!
//! if let LoadOutcome::Fresh(page) = view.load(LoadRequest::new("domain")).await? {
//!     println!("{} records", page.total);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod catalog;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod filters;
pub mod grouping;
pub mod raw;
pub mod record;
pub mod resolver;
pub mod submission;
pub mod table;
pub mod view;

pub use catalog::{
    require_resource, resource, resources, ActionMethod, ActionSpec, ColumnRegistry, DisplayMode,
    ResourceCategory, ResourceSpec,
};
pub use dashboard::{
    dashboard_counts, device_info, load_dashboard, Dashboard, DashboardSummary, DeviceInfo,
    StatCount,
};
pub use envelope::{normalize, ListEnvelope};
pub use error::{ExplorerError, ExplorerResult};
pub use filters::{query_params, FilterBuilder, FilterRowId, Filters, Pagination, PaginationControls};
pub use grouping::{flatten, group_and_resolve, group_by_task, present, GroupView, TaskGroups};
pub use raw::{send_raw, RawMethod, RawRequest};
pub use record::{record_id, task_key, Record, TaskMeta, UNKNOWN_TASK};
pub use resolver::{MetaMap, ResolverConfig, TaskMetaResolver};
pub use submission::{
    submit, AssetScopeSubmission, GithubTaskSubmission, PolicyTaskSubmission, ScanPreset,
    ScheduleSubmission, ScopeSync, ScopeType, Submission, TaskSubmission, TaskTag,
};
pub use table::{
    escape_html, escape_terminal, format_cell, infer_columns, ActionOutcome, Cell, ColumnSpec,
    RowAction, Table,
};
pub use view::{GroupPanel, LoadOutcome, LoadRequest, LoadedView, ResourceView, ViewBody};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building views
    pub use crate::catalog::{resource, DisplayMode};
    pub use crate::error::{ExplorerError, ExplorerResult};
    pub use crate::filters::{FilterBuilder, Pagination, PaginationControls};
    pub use crate::resolver::TaskMetaResolver;
    pub use crate::table::{RowAction, Table};
    pub use crate::view::{LoadOutcome, LoadRequest, ResourceView, ViewBody};
    pub use arl_transport::prelude::*;
}
