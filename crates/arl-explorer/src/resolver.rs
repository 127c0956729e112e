//! Task metadata resolution using moka
//!
//! Result records only carry a parent task id. The resolver looks the task
//! up once per id and shares the answer:
//! - Concurrent requests for the same id are coalesced into one lookup
//! - Answers, including "not found", are cached
//! - Lookup failures are swallowed and cached as "not found"

use crate::envelope::normalize;
use crate::record::{TaskMeta, UNKNOWN_TASK};
use arl_transport::{QueryParams, RequestOptions, Transport};
use futures::future::join_all;
use indexmap::IndexSet;
use moka::future::Cache;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Resolved metadata keyed by task id; unresolved ids are absent
pub type MetaMap = HashMap<String, Arc<TaskMeta>>;

/// Resolver tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum cached ids
    pub max_capacity: u64,
    /// Entry lifetime; `None` keeps entries until evicted
    pub ttl: Option<Duration>,
    /// Collection path task records are looked up on
    pub lookup_path: String,
}

impl ResolverConfig {
    /// Set capacity
    #[inline]
    #[must_use]
    pub fn with_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Set entry lifetime
    #[inline]
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set lookup path
    #[inline]
    #[must_use]
    pub fn with_lookup_path(mut self, path: impl Into<String>) -> Self {
        self.lookup_path = path.into();
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: None,
            lookup_path: "task/".to_string(),
        }
    }
}

/// Coalescing, caching task metadata lookup
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct TaskMetaResolver {
    transport: Arc<dyn Transport>,
    cache: Cache<String, Option<Arc<TaskMeta>>>,
    lookup_path: Arc<str>,
}

impl TaskMetaResolver {
    /// Create resolver with default capacity (10,000 ids)
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, ResolverConfig::default())
    }

    /// Create resolver from explicit tuning
    #[must_use]
    pub fn with_config(transport: Arc<dyn Transport>, config: ResolverConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.max_capacity);
        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            transport,
            cache: builder.build(),
            lookup_path: config.lookup_path.into(),
        }
    }

    /// Resolve one task id
    ///
    /// An empty id answers `None` without touching the cache. Any other id
    /// triggers at most one backend lookup for the lifetime of its entry,
    /// however many callers ask concurrently.
    pub async fn resolve(&self, task_id: &str) -> Option<Arc<TaskMeta>> {
        if task_id.is_empty() {
            return None;
        }
        self.cache
            .get_with(task_id.to_string(), self.lookup(task_id.to_string()))
            .await
    }

    /// Resolve a batch of ids concurrently
    ///
    /// Duplicates, empty ids and the unknown-task key are skipped. Ids that
    /// do not resolve are absent from the result.
    pub async fn resolve_many<I, S>(&self, task_ids: I) -> MetaMap
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: IndexSet<String> = task_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .filter(|id| !id.is_empty() && id != UNKNOWN_TASK)
            .collect();

        let lookups = unique.into_iter().map(|id| async move {
            let meta = self.resolve(&id).await;
            (id, meta)
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(id, meta)| meta.map(|meta| (id, meta)))
            .collect()
    }

    async fn lookup(&self, task_id: String) -> Option<Arc<TaskMeta>> {
        debug!(task_id = %task_id, path = %self.lookup_path, "task metadata cache miss; looking up");
        let params = QueryParams::new()
            .with("_id", task_id.as_str())
            .with("page", 1)
            .with("size", 1);

        match self
            .transport
            .get_with(&self.lookup_path, &params, RequestOptions::silent())
            .await
        {
            Ok(body) => {
                let meta = normalize(&body)
                    .items
                    .first()
                    .and_then(|record| TaskMeta::from_value(task_id.as_str(), record))
                    .map(Arc::new);
                if meta.is_none() {
                    debug!(task_id = %task_id, "task not found");
                }
                meta
            }
            Err(err) => {
                warn!(task_id = %task_id, error = %err, "task metadata lookup failed");
                None
            }
        }
    }

    /// Drop one cached id so the next request looks it up again
    #[inline]
    pub async fn invalidate(&self, task_id: &str) {
        self.cache.invalidate(task_id).await;
    }

    /// Drop every cached id
    #[inline]
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Flush pending cache maintenance so counts are exact
    #[inline]
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Get approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl fmt::Debug for TaskMetaResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskMetaResolver")
            .field("lookup_path", &self.lookup_path)
            .field("entry_count", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}
