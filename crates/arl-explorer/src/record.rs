//! Schema-free records and parent task metadata

use arl_transport::is_truthy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field-name to value mapping returned by collection endpoints
pub type Record = Map<String, Value>;

/// Group key for records without a parent reference
pub const UNKNOWN_TASK: &str = "unknown";

/// Foreign-key fields consulted in order
pub const TASK_KEY_FIELDS: [&str; 2] = ["task_id", "github_task_id"];

/// Truthy field rendered as a key string
///
/// Strings are used verbatim; other scalars use their JSON text.
#[must_use]
pub fn field_key(item: &Value, field: &str) -> Option<String> {
    let value = item.get(field)?;
    if !is_truthy(value) {
        return None;
    }
    Some(match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Parent task key for a record, or [`UNKNOWN_TASK`]
#[must_use]
pub fn task_key(item: &Value) -> String {
    TASK_KEY_FIELDS
        .iter()
        .find_map(|field| field_key(item, field))
        .unwrap_or_else(|| UNKNOWN_TASK.to_string())
}

/// Record identifier (`_id`), used by row actions
#[must_use]
pub fn record_id(item: &Value) -> Option<String> {
    field_key(item, "_id")
}

/// Parent task record, resolved lazily by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta {
    /// Identifier the record was looked up by
    pub id: String,
    /// Task name, when set
    pub name: Option<String>,
    /// Task target, when set
    pub target: Option<String>,
    /// Full backend record
    pub record: Record,
}

impl TaskMeta {
    /// Build from a backend record; `None` for non-object values
    #[must_use]
    pub fn from_value(id: impl Into<String>, value: &Value) -> Option<Self> {
        let record = value.as_object()?.clone();
        let text = |field: &str| field_key(value, field);
        Some(Self {
            id: id.into(),
            name: text("name"),
            target: text("target"),
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_key_prefers_task_id() {
        let item = json!({"task_id": "t1", "github_task_id": "g1"});
        assert_eq!(task_key(&item), "t1");
    }

    #[test]
    fn task_key_falls_back_to_github_task() {
        assert_eq!(task_key(&json!({"task_id": "", "github_task_id": "g1"})), "g1");
        assert_eq!(task_key(&json!({"task_id": null, "github_task_id": "g1"})), "g1");
    }

    #[test]
    fn task_key_defaults_to_unknown() {
        assert_eq!(task_key(&json!({"v": 3})), UNKNOWN_TASK);
        assert_eq!(task_key(&json!(17)), UNKNOWN_TASK);
    }

    #[test]
    fn numeric_keys_are_stringified() {
        assert_eq!(task_key(&json!({"task_id": 42})), "42");
    }

    #[test]
    fn task_meta_from_record() {
        let meta = TaskMeta::from_value(
            "t1",
            &json!({"_id": "t1", "name": "Recon A", "target": "example.com", "status": "done"}),
        )
        .unwrap();
        assert_eq!(meta.name.as_deref(), Some("Recon A"));
        assert_eq!(meta.target.as_deref(), Some("example.com"));
        assert_eq!(meta.record["status"], json!("done"));
        assert!(TaskMeta::from_value("t1", &json!("nope")).is_none());
    }

    #[test]
    fn blank_name_is_absent() {
        let meta = TaskMeta::from_value("t1", &json!({"name": ""})).unwrap();
        assert!(meta.name.is_none());
    }
}
