//! Partition result records by parent task

use crate::record::{task_key, UNKNOWN_TASK};
use crate::resolver::{MetaMap, TaskMetaResolver};
use indexmap::IndexMap;
use serde_json::Value;

/// Records per task key, in first-seen key order
pub type TaskGroups = IndexMap<String, Vec<Value>>;

/// Title for a resolved task with no name
pub const UNNAMED_TASK_TITLE: &str = "Unnamed task";

/// Title for records without a parent reference
pub const UNKNOWN_TASK_TITLE: &str = "Unknown task";

/// Subtitle for records without a parent reference
pub const UNKNOWN_TASK_SUBTITLE: &str = "No task ID found";

/// Partition records by [`task_key`]
///
/// Order within each group follows input order.
#[must_use]
pub fn group_by_task(items: &[Value]) -> TaskGroups {
    let mut groups = TaskGroups::new();
    for item in items {
        groups.entry(task_key(item)).or_default().push(item.clone());
    }
    groups
}

/// Concatenate groups back into one sequence, in group order
#[must_use]
pub fn flatten(groups: &TaskGroups) -> Vec<Value> {
    groups.values().flatten().cloned().collect()
}

/// One titled group ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct GroupView {
    /// Task key the group was built from
    pub key: String,
    /// Task name, or a placeholder
    pub title: String,
    /// Target and id line
    pub subtitle: String,
    /// Number of records in the group
    pub count: usize,
    /// The records
    pub rows: Vec<Value>,
}

/// Attach titles to groups
///
/// Resolved tasks show their name and target; unresolved keys show the bare
/// id; the unknown key gets a fixed sentinel.
#[must_use]
pub fn present(groups: TaskGroups, metas: &MetaMap) -> Vec<GroupView> {
    groups
        .into_iter()
        .map(|(key, rows)| {
            let (title, subtitle) = heading(&key, metas);
            GroupView {
                count: rows.len(),
                key,
                title,
                subtitle,
                rows,
            }
        })
        .collect()
}

fn heading(key: &str, metas: &MetaMap) -> (String, String) {
    if key == UNKNOWN_TASK {
        return (UNKNOWN_TASK_TITLE.into(), UNKNOWN_TASK_SUBTITLE.into());
    }
    match metas.get(key) {
        Some(meta) => (
            meta.name
                .clone()
                .unwrap_or_else(|| UNNAMED_TASK_TITLE.to_string()),
            format!(
                "Target: {} · ID: {key}",
                meta.target.as_deref().unwrap_or("-")
            ),
        ),
        None => (key.to_string(), format!("ID: {key}")),
    }
}

/// Group records and resolve every group's parent task
pub async fn group_and_resolve(resolver: &TaskMetaResolver, items: &[Value]) -> Vec<GroupView> {
    let groups = group_by_task(items);
    let metas = resolver.resolve_many(groups.keys()).await;
    present(groups, &metas)
}
