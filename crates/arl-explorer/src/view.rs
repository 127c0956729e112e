//! Resource view loading
//!
//! A view owns the "current page" of one screen. Every load takes a
//! generation ticket; a load that settles after a newer one started is
//! discarded instead of overwriting fresher state.

use crate::catalog::{resource, ColumnRegistry, DisplayMode};
use crate::envelope::normalize;
use crate::error::ExplorerResult;
use crate::filters::{query_params, Filters, Pagination};
use crate::grouping::{group_and_resolve, GroupView};
use crate::resolver::TaskMetaResolver;
use crate::table::{ColumnSpec, RowAction, Table};
use arl_transport::{ApiContext, Notice, Transport};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What to load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    /// Collection name
    pub resource: String,
    /// Filter pairs
    pub filters: Filters,
    /// Page, size and order
    pub pagination: Pagination,
    /// Display mode
    pub mode: DisplayMode,
}

impl LoadRequest {
    /// First page of `resource` in its default mode
    #[must_use]
    pub fn new(resource_name: impl Into<String>) -> Self {
        let resource_name = resource_name.into();
        let mode = resource(&resource_name).map_or(DisplayMode::Flat, |spec| spec.default_mode());
        Self {
            resource: resource_name,
            filters: Filters::new(),
            pagination: Pagination::default(),
            mode,
        }
    }

    /// Set filters
    #[must_use]
    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Set pagination
    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Set display mode
    #[must_use]
    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }
}

/// One titled group with its table
#[derive(Debug, Clone)]
pub struct GroupPanel {
    /// Task key
    pub key: String,
    /// Heading
    pub title: String,
    /// Secondary heading
    pub subtitle: String,
    /// Record count
    pub count: usize,
    /// Group records
    pub table: Table,
}

/// Rendered page body
#[derive(Debug, Clone)]
pub enum ViewBody {
    /// The page had no records
    Empty,
    /// Single table
    Flat(Table),
    /// One panel per parent task
    Grouped(Vec<GroupPanel>),
}

/// Settled page of a resource
#[derive(Debug, Clone)]
pub struct LoadedView {
    /// Generation the page was loaded under
    pub generation: u64,
    /// Collection name
    pub resource: String,
    /// Display mode of `body`
    pub mode: DisplayMode,
    /// Backend-reported total
    pub total: u64,
    /// Raw page records
    pub items: Vec<Value>,
    /// Columns used for every table
    pub columns: Vec<ColumnSpec>,
    /// Rendered body
    pub body: ViewBody,
}

/// Result of a load
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// Newest load; stored as the current page
    Fresh(Arc<LoadedView>),
    /// Superseded by a newer load and discarded
    Stale {
        /// Generation of the discarded load
        generation: u64,
    },
}

impl LoadOutcome {
    /// Page of a fresh outcome
    #[must_use]
    pub fn fresh(&self) -> Option<&Arc<LoadedView>> {
        match self {
            Self::Fresh(view) => Some(view),
            Self::Stale { .. } => None,
        }
    }

    /// Whether the load was discarded
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Loader and holder of one screen's current page
pub struct ResourceView {
    ctx: ApiContext,
    transport: Arc<dyn Transport>,
    resolver: TaskMetaResolver,
    registry: Arc<ColumnRegistry>,
    generation: AtomicU64,
    current: RwLock<Option<Arc<LoadedView>>>,
}

impl ResourceView {
    /// Create view using the catalog layouts
    #[must_use]
    pub fn new(ctx: ApiContext, transport: Arc<dyn Transport>, resolver: TaskMetaResolver) -> Self {
        Self::with_registry(ctx, transport, resolver, Arc::new(ColumnRegistry::with_catalog()))
    }

    /// Create view with a custom column registry
    #[must_use]
    pub fn with_registry(
        ctx: ApiContext,
        transport: Arc<dyn Transport>,
        resolver: TaskMetaResolver,
        registry: Arc<ColumnRegistry>,
    ) -> Self {
        Self {
            ctx,
            transport,
            resolver,
            registry,
            generation: AtomicU64::new(0),
            current: RwLock::new(None),
        }
    }

    /// Current page, if any load has settled fresh
    #[must_use]
    pub fn current(&self) -> Option<Arc<LoadedView>> {
        self.current.read().clone()
    }

    /// Latest issued generation
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Fetch, normalize and render one page
    ///
    /// On failure the previous page is kept and an error notice is sent.
    pub async fn load(&self, request: LoadRequest) -> ExplorerResult<LoadOutcome> {
        let generation = self.next_generation();
        debug!(resource = %request.resource, generation, "loading resource page");

        match self.fetch(&request, generation).await {
            Ok(view) => Ok(self.settle(view)),
            Err(err) => {
                if self.is_current(generation) {
                    self.ctx.notify(Notice::error(format!(
                        "Failed to load {}: {}",
                        request.resource,
                        err.operator_message()
                    )));
                }
                warn!(resource = %request.resource, generation, error = %err, "load failed");
                Err(err)
            }
        }
    }

    /// Re-present the current page in another mode without fetching it again
    ///
    /// Returns `None` when nothing has been loaded yet.
    pub async fn rerender(&self, mode: DisplayMode) -> Option<LoadOutcome> {
        let previous = self.current()?;
        let generation = self.next_generation();
        let actions = self.actions_for(&previous.resource);
        let body = self
            .render_body(mode, &previous.items, &previous.columns, &actions)
            .await;
        Some(self.settle(LoadedView {
            generation,
            resource: previous.resource.clone(),
            mode,
            total: previous.total,
            items: previous.items.clone(),
            columns: previous.columns.clone(),
            body,
        }))
    }

    async fn fetch(&self, request: &LoadRequest, generation: u64) -> ExplorerResult<LoadedView> {
        let params = query_params(&request.filters, &request.pagination);
        let body = self
            .transport
            .get(&format!("{}/", request.resource), &params)
            .await?;

        let envelope = normalize(&body);
        let columns = self.registry.columns_for(&request.resource, &envelope.items);
        let actions = self.actions_for(&request.resource);
        let rendered = self
            .render_body(request.mode, &envelope.items, &columns, &actions)
            .await;

        Ok(LoadedView {
            generation,
            resource: request.resource.clone(),
            mode: request.mode,
            total: envelope.total,
            items: envelope.items,
            columns,
            body: rendered,
        })
    }

    fn actions_for(&self, resource_name: &str) -> Vec<RowAction> {
        resource(resource_name)
            .map(|spec| spec.row_actions(&self.transport))
            .unwrap_or_default()
    }

    async fn render_body(
        &self,
        mode: DisplayMode,
        items: &[Value],
        columns: &[ColumnSpec],
        actions: &[RowAction],
    ) -> ViewBody {
        if items.is_empty() {
            return ViewBody::Empty;
        }
        match mode {
            DisplayMode::Flat => ViewBody::Flat(Table::render(Some(columns), items, actions.to_vec())),
            DisplayMode::Grouped => {
                let groups = group_and_resolve(&self.resolver, items).await;
                ViewBody::Grouped(groups.into_iter().map(|g| panel(g, columns, actions)).collect())
            }
        }
    }

    fn settle(&self, view: LoadedView) -> LoadOutcome {
        let mut current = self.current.write();
        if !self.is_current(view.generation) {
            debug!(resource = %view.resource, generation = view.generation, "discarding stale page");
            return LoadOutcome::Stale {
                generation: view.generation,
            };
        }
        info!(
            resource = %view.resource,
            total = view.total,
            items = view.items.len(),
            "page loaded"
        );
        let view = Arc::new(view);
        *current = Some(Arc::clone(&view));
        LoadOutcome::Fresh(view)
    }
}

fn panel(group: GroupView, columns: &[ColumnSpec], actions: &[RowAction]) -> GroupPanel {
    GroupPanel {
        table: Table::render(Some(columns), &group.rows, actions.to_vec()),
        key: group.key,
        title: group.title,
        subtitle: group.subtitle,
        count: group.count,
    }
}

impl std::fmt::Debug for ResourceView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceView")
            .field("generation", &self.generation())
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
