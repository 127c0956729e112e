//! Resource catalog
//!
//! Every browsable collection is described by data: its path, category,
//! optional column layout and row actions. One view renders them all.

use crate::error::{ExplorerError, ExplorerResult};
use crate::record::record_id;
use crate::table::{infer_columns, ColumnSpec, RowAction};
use arl_transport::{join_url, QueryParams, Transport};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Kind of collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    /// Findings produced by tasks
    Result,
    /// Synced asset library
    Asset,
    /// Operator-managed objects
    Management,
}

/// Display mode for a loaded page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// One table per parent task
    Grouped,
    /// One table for the whole page
    Flat,
}

/// HTTP method of an action call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMethod {
    /// Query-only call
    Get,
    /// JSON body call
    Post,
    /// Backend URL handed to the operator; nothing is called
    Link,
}

/// Row action described as data
#[derive(Clone, Copy)]
pub struct ActionSpec {
    /// Button label
    pub label: &'static str,
    /// Call method
    pub method: ActionMethod,
    /// Path template; `{id}` is replaced by the row's `_id`
    pub path: &'static str,
    /// Body builder for POST calls
    pub payload: Option<fn(&str) -> Value>,
}

impl ActionSpec {
    const fn get(label: &'static str, path: &'static str) -> Self {
        Self {
            label,
            method: ActionMethod::Get,
            path,
            payload: None,
        }
    }

    const fn post(label: &'static str, path: &'static str, payload: fn(&str) -> Value) -> Self {
        Self {
            label,
            method: ActionMethod::Post,
            path,
            payload: Some(payload),
        }
    }

    const fn link(label: &'static str, path: &'static str) -> Self {
        Self {
            label,
            method: ActionMethod::Link,
            path,
            payload: None,
        }
    }

    /// Absolute URL of a link action under `base_url`
    #[must_use]
    pub fn href(&self, base_url: &str, id: &str) -> Option<String> {
        (self.method == ActionMethod::Link).then(|| join_url(base_url, &self.path_for(id)))
    }

    /// Concrete path for a row id
    #[must_use]
    pub fn path_for(&self, id: &str) -> String {
        self.path.replace("{id}", id)
    }

    /// Concrete body for a row id
    #[must_use]
    pub fn payload_for(&self, id: &str) -> Value {
        self.payload.map_or_else(|| json!({}), |build| build(id))
    }

    /// Bind to a transport as a runnable row action
    #[must_use]
    pub fn bind(&self, transport: Arc<dyn Transport>) -> RowAction {
        let spec = *self;
        RowAction::new(spec.label, move |row: Value| {
            let transport = Arc::clone(&transport);
            async move {
                let id = record_id(&row)
                    .ok_or_else(|| ExplorerError::action(spec.label, "record has no _id"))?;
                spec.execute(transport.as_ref(), &id).await
            }
        })
    }

    /// Issue the call for one row id
    ///
    /// Link actions answer `{"href": path}` without touching the backend.
    pub async fn execute(&self, transport: &dyn Transport, id: &str) -> ExplorerResult<Value> {
        let path = self.path_for(id);
        info!(label = self.label, path = %path, "running row action");
        let body = match self.method {
            ActionMethod::Get => transport.get(&path, &QueryParams::new()).await?,
            ActionMethod::Post => transport.post(&path, &self.payload_for(id)).await?,
            ActionMethod::Link => json!({ "href": path }),
        };
        Ok(body)
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("label", &self.label)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

fn task_ids(id: &str) -> Value {
    json!({ "task_id": [id] })
}

fn task_ids_with_data(id: &str) -> Value {
    json!({ "task_id": [id], "del_task_data": true })
}

fn scope_ids(id: &str) -> Value {
    json!({ "scope_id": [id] })
}

fn job_id(id: &str) -> Value {
    json!({ "job_id": id })
}

fn job_ids(id: &str) -> Value {
    json!({ "job_id": [id] })
}

fn record_ids(id: &str) -> Value {
    json!({ "_id": [id] })
}

/// One browsable collection
#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    /// Collection name, also its path stem
    pub name: &'static str,
    /// Human label
    pub label: &'static str,
    /// Collection kind
    pub category: ResourceCategory,
    /// Explicit `(key, label)` layout; empty means inferred
    pub columns: &'static [(&'static str, &'static str)],
    /// Row actions
    pub actions: &'static [ActionSpec],
}

impl ResourceSpec {
    const fn result(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            category: ResourceCategory::Result,
            columns: &[],
            actions: &[],
        }
    }

    const fn asset(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            category: ResourceCategory::Asset,
            columns: &[],
            actions: &[],
        }
    }

    const fn managed(
        name: &'static str,
        label: &'static str,
        columns: &'static [(&'static str, &'static str)],
        actions: &'static [ActionSpec],
    ) -> Self {
        Self {
            name,
            label,
            category: ResourceCategory::Management,
            columns,
            actions,
        }
    }

    /// Collection path, e.g. `domain/`
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}/", self.name)
    }

    /// Results and assets group by task; management lists are flat
    #[must_use]
    pub fn default_mode(&self) -> DisplayMode {
        match self.category {
            ResourceCategory::Result | ResourceCategory::Asset => DisplayMode::Grouped,
            ResourceCategory::Management => DisplayMode::Flat,
        }
    }

    /// Explicit columns, if any
    #[must_use]
    pub fn column_specs(&self) -> Option<Vec<ColumnSpec>> {
        (!self.columns.is_empty()).then(|| {
            self.columns
                .iter()
                .map(|(key, label)| ColumnSpec::new(*key, *label))
                .collect()
        })
    }

    /// Actions bound to a transport
    #[must_use]
    pub fn row_actions(&self, transport: &Arc<dyn Transport>) -> Vec<RowAction> {
        self.actions
            .iter()
            .map(|action| action.bind(Arc::clone(transport)))
            .collect()
    }

    /// Action by label, ignoring case
    #[must_use]
    pub fn action(&self, label: &str) -> Option<&'static ActionSpec> {
        self.actions
            .iter()
            .find(|action| action.label.eq_ignore_ascii_case(label))
    }
}

const TASK_COLUMNS: &[(&str, &str)] = &[
    ("name", "Name"),
    ("target", "Target"),
    ("status", "Status"),
    ("task_tag", "Tag"),
    ("type", "Type"),
    ("start_time", "Started"),
    ("end_time", "Ended"),
    ("_id", "ID"),
];

const TASK_ACTIONS: &[ActionSpec] = &[
    ActionSpec::get("Stop", "task/stop/{id}"),
    ActionSpec::post("Restart", "task/restart/", task_ids),
    ActionSpec::post("Delete", "task/delete/", task_ids_with_data),
    ActionSpec::link("Export", "export/{id}"),
];

const SCOPE_COLUMNS: &[(&str, &str)] = &[
    ("name", "Name"),
    ("scope_type", "Type"),
    ("scope", "Scope"),
    ("black_scope", "Excluded"),
    ("_id", "ID"),
];

const SCOPE_ACTIONS: &[ActionSpec] = &[ActionSpec::post("Delete", "asset_scope/delete/", scope_ids)];

const SCHEDULER_COLUMNS: &[(&str, &str)] = &[
    ("name", "Name"),
    ("domain", "Domain"),
    ("scope_id", "Scope ID"),
    ("interval", "Interval"),
    ("status", "Status"),
    ("next_run_date", "Next run"),
    ("run_number", "Runs"),
    ("_id", "ID"),
];

const SCHEDULER_ACTIONS: &[ActionSpec] = &[
    ActionSpec::post("Stop", "scheduler/stop/", job_id),
    ActionSpec::post("Recover", "scheduler/recover/", job_id),
    ActionSpec::post("Delete", "scheduler/delete/", job_ids),
];

const GITHUB_TASK_COLUMNS: &[(&str, &str)] = &[
    ("name", "Name"),
    ("keyword", "Keyword"),
    ("status", "Status"),
    ("start_time", "Started"),
    ("end_time", "Ended"),
    ("_id", "ID"),
];

const GITHUB_TASK_ACTIONS: &[ActionSpec] = &[
    ActionSpec::post("Stop", "github_task/stop/", record_ids),
    ActionSpec::post("Delete", "github_task/delete/", record_ids),
];

static CATALOG: &[ResourceSpec] = &[
    ResourceSpec::result("domain", "Domains"),
    ResourceSpec::result("ip", "IPs"),
    ResourceSpec::result("site", "Sites"),
    ResourceSpec::result("url", "URLs"),
    ResourceSpec::result("cert", "Certificates"),
    ResourceSpec::result("service", "Services"),
    ResourceSpec::result("fileleak", "File leaks"),
    ResourceSpec::result("vuln", "Vulnerabilities"),
    ResourceSpec::result("wih", "Web info"),
    ResourceSpec::result("nuclei_result", "Nuclei results"),
    ResourceSpec::result("npoc_service", "PoC services"),
    ResourceSpec::result("stat_finger", "Fingerprint stats"),
    ResourceSpec::result("cip", "C-segment IPs"),
    ResourceSpec::asset("asset_domain", "Asset domains"),
    ResourceSpec::asset("asset_ip", "Asset IPs"),
    ResourceSpec::asset("asset_site", "Asset sites"),
    ResourceSpec::asset("asset_wih", "Asset web info"),
    ResourceSpec::managed("task", "Tasks", TASK_COLUMNS, TASK_ACTIONS),
    ResourceSpec::managed("asset_scope", "Asset scopes", SCOPE_COLUMNS, SCOPE_ACTIONS),
    ResourceSpec::managed("scheduler", "Schedules", SCHEDULER_COLUMNS, SCHEDULER_ACTIONS),
    ResourceSpec::managed("github_task", "GitHub tasks", GITHUB_TASK_COLUMNS, GITHUB_TASK_ACTIONS),
    ResourceSpec::managed("github_result", "GitHub results", &[], &[]),
    ResourceSpec::managed("policy", "Policies", &[], &[]),
];

/// Every catalog resource
#[must_use]
pub fn resources() -> &'static [ResourceSpec] {
    CATALOG
}

/// Resource by name
#[must_use]
pub fn resource(name: &str) -> Option<&'static ResourceSpec> {
    CATALOG.iter().find(|spec| spec.name == name)
}

/// Resource by name, or [`ExplorerError::UnknownResource`]
pub fn require_resource(name: &str) -> ExplorerResult<&'static ResourceSpec> {
    resource(name).ok_or_else(|| ExplorerError::UnknownResource(name.to_string()))
}

/// Column layouts per resource with inference fallback
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    explicit: HashMap<String, Vec<ColumnSpec>>,
}

impl ColumnRegistry {
    /// Empty registry; every resource is inferred
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every catalog layout
    #[must_use]
    pub fn with_catalog() -> Self {
        let mut registry = Self::new();
        for spec in CATALOG {
            if let Some(columns) = spec.column_specs() {
                registry.register(spec.name, columns);
            }
        }
        registry
    }

    /// Set the layout for a resource
    pub fn register(&mut self, resource: impl Into<String>, columns: Vec<ColumnSpec>) {
        self.explicit.insert(resource.into(), columns);
    }

    /// Whether a resource has an explicit layout
    #[must_use]
    pub fn has_explicit(&self, resource: &str) -> bool {
        self.explicit.contains_key(resource)
    }

    /// Layout for a page of `resource`
    #[must_use]
    pub fn columns_for(&self, resource: &str, items: &[Value]) -> Vec<ColumnSpec> {
        self.explicit
            .get(resource)
            .cloned()
            .unwrap_or_else(|| infer_columns(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arl_test_utils::ScriptedTransport;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<&str> = resources().iter().map(|r| r.name).collect();
        assert_eq!(names.len(), resources().len());
    }

    #[test]
    fn default_modes() {
        assert_eq!(resource("domain").unwrap().default_mode(), DisplayMode::Grouped);
        assert_eq!(resource("asset_ip").unwrap().default_mode(), DisplayMode::Grouped);
        assert_eq!(resource("task").unwrap().default_mode(), DisplayMode::Flat);
        assert!(resource("bogus").is_none());
        assert!(matches!(
            require_resource("bogus"),
            Err(ExplorerError::UnknownResource(_))
        ));
    }

    #[test]
    fn action_templates() {
        let task = resource("task").unwrap();
        let stop = task.action("stop").unwrap();
        assert_eq!(stop.method, ActionMethod::Get);
        assert_eq!(stop.path_for("t1"), "task/stop/t1");

        let delete = task.action("Delete").unwrap();
        assert_eq!(delete.path_for("t1"), "task/delete/");
        assert_eq!(
            delete.payload_for("t1"),
            json!({"task_id": ["t1"], "del_task_data": true})
        );

        let recover = resource("scheduler").unwrap().action("Recover").unwrap();
        assert_eq!(recover.payload_for("j1"), json!({"job_id": "j1"}));
        assert_eq!(
            resource("github_task").unwrap().action("Stop").unwrap().payload_for("g1"),
            json!({"_id": ["g1"]})
        );
    }

    #[tokio::test]
    async fn export_is_a_link_without_backend_call() {
        let transport = ScriptedTransport::new();
        let export = resource("task").unwrap().action("export").unwrap();
        assert_eq!(export.method, ActionMethod::Link);
        assert_eq!(
            export.href("http://127.0.0.1:5003/api/", "t1").as_deref(),
            Some("http://127.0.0.1:5003/api/export/t1")
        );
        assert_eq!(
            export.execute(&transport, "t1").await.unwrap(),
            json!({"href": "export/t1"})
        );
        assert!(transport.calls().is_empty());
        assert!(resource("task").unwrap().action("Stop").unwrap().href("http://x", "t1").is_none());
    }

    #[test]
    fn registry_prefers_explicit_layout() {
        let registry = ColumnRegistry::with_catalog();
        let items = vec![json!({"zzz": 1})];

        let task: Vec<String> = registry.columns_for("task", &items).into_iter().map(|c| c.key).collect();
        assert_eq!(task.first().map(String::as_str), Some("name"));
        assert_eq!(task.len(), 8);

        let inferred = registry.columns_for("domain", &items);
        assert_eq!(inferred, vec![ColumnSpec::keyed("zzz")]);
        assert!(!registry.has_explicit("policy"));
    }
}
