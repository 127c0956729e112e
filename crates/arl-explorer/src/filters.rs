//! Editable filter rows and pagination controls
//!
//! Both builders hand out zero-argument getters that read the live state
//! at call time, so a view can ask for "the current query" whenever it
//! reloads.

use arl_transport::QueryParams;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Trimmed, non-blank filter pairs in row order
pub type Filters = IndexMap<String, String>;

/// Stable handle for one filter row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterRowId(u64);

/// One key/value editing row, as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRow {
    /// Field name
    pub key: String,
    /// Field value
    pub value: String,
}

#[derive(Debug, Default)]
struct FilterState {
    next_id: u64,
    rows: IndexMap<FilterRowId, FilterRow>,
}

impl FilterState {
    fn collect(&self) -> Filters {
        let mut filters = Filters::new();
        for row in self.rows.values() {
            let key = row.key.trim();
            let value = row.value.trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            filters.insert(key.to_string(), value.to_string());
        }
        filters
    }
}

/// Dynamic list of key/value filter rows
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    state: Arc<RwLock<FilterState>>,
}

impl FilterBuilder {
    /// Create builder with no rows
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create builder pre-populated with rows
    #[must_use]
    pub fn with_rows<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let builder = Self::new();
        for (key, value) in rows {
            builder.add_row(key, value);
        }
        builder
    }

    /// Append a row
    pub fn add_row(&self, key: impl Into<String>, value: impl Into<String>) -> FilterRowId {
        let mut state = self.state.write();
        let id = FilterRowId(state.next_id);
        state.next_id += 1;
        state.rows.insert(
            id,
            FilterRow {
                key: key.into(),
                value: value.into(),
            },
        );
        id
    }

    /// Replace a row's contents; `false` when the row is gone
    pub fn update_row(
        &self,
        id: FilterRowId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> bool {
        match self.state.write().rows.get_mut(&id) {
            Some(row) => {
                row.key = key.into();
                row.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Remove a row; `false` when the row is gone
    pub fn remove_row(&self, id: FilterRowId) -> bool {
        self.state.write().rows.shift_remove(&id).is_some()
    }

    /// Rows as typed, in display order
    #[must_use]
    pub fn rows(&self) -> Vec<(FilterRowId, FilterRow)> {
        self.state
            .read()
            .rows
            .iter()
            .map(|(id, row)| (*id, row.clone()))
            .collect()
    }

    /// Current filters
    ///
    /// Keys and values are trimmed; rows blank on either side are dropped;
    /// a repeated key keeps its first position and its last value.
    #[must_use]
    pub fn filters(&self) -> Filters {
        self.state.read().collect()
    }

    /// Getter reading the live rows on every call
    #[must_use]
    pub fn getter(&self) -> impl Fn() -> Filters + Send + Sync + 'static {
        let state = Arc::clone(&self.state);
        move || state.read().collect()
    }
}

/// Default first page
pub const DEFAULT_PAGE: &str = "1";

/// Default page size
pub const DEFAULT_SIZE: &str = "10";

/// Default order: newest first
pub const DEFAULT_ORDER: &str = "-_id";

/// Page, size and order exactly as entered
///
/// Values are not validated; blank values are omitted from the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page number
    pub page: String,
    /// Page size
    pub size: String,
    /// Sort order
    pub order: String,
}

impl Pagination {
    /// Create pagination from raw entries
    #[must_use]
    pub fn new(page: impl Into<String>, size: impl Into<String>, order: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            size: size.into(),
            order: order.into(),
        }
    }

    /// As query parameters
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .with("page", self.page.as_str())
            .with("size", self.size.as_str())
            .with("order", self.order.as_str())
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_SIZE, DEFAULT_ORDER)
    }
}

/// Live page, size and order inputs
#[derive(Debug, Clone, Default)]
pub struct PaginationControls {
    state: Arc<RwLock<Pagination>>,
}

impl PaginationControls {
    /// Create controls starting from `initial`
    #[must_use]
    pub fn new(initial: Pagination) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
        }
    }

    /// Set page entry
    pub fn set_page(&self, page: impl Into<String>) {
        self.state.write().page = page.into();
    }

    /// Set size entry
    pub fn set_size(&self, size: impl Into<String>) {
        self.state.write().size = size.into();
    }

    /// Set order entry
    pub fn set_order(&self, order: impl Into<String>) {
        self.state.write().order = order.into();
    }

    /// Current entries
    #[must_use]
    pub fn current(&self) -> Pagination {
        self.state.read().clone()
    }

    /// Getter reading the live entries on every call
    #[must_use]
    pub fn getter(&self) -> impl Fn() -> Pagination + Send + Sync + 'static {
        let state = Arc::clone(&self.state);
        move || state.read().clone()
    }
}

/// Filters followed by pagination; pagination wins on key collisions
#[must_use]
pub fn query_params(filters: &Filters, pagination: &Pagination) -> QueryParams {
    let mut params: QueryParams = filters
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    params.merge(pagination.to_params());
    params
}
