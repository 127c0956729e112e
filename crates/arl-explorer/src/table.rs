//! Dynamic table rendering for schema-free records
//!
//! Columns are either supplied or inferred from the first record. Cell
//! formatting depends only on the column key and the raw value:
//!
//! | Value | Cell |
//! |---|---|
//! | missing or `null` | placeholder `-` |
//! | any value under a status key | tag |
//! | sequence or mapping | code preview, JSON text cut at 120 chars |
//! | other scalar | text, 117 chars plus `...` when over 120 |

use crate::error::{ExplorerError, ExplorerResult};
use crate::record::record_id;
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt::{self, Write as _};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Maximum columns inferred from a record
pub const MAX_INFERRED_COLUMNS: usize = 7;

/// Longest cell text shown in full
pub const MAX_CELL_CHARS: usize = 120;

const TRUNCATED_CHARS: usize = 117;

/// Truncation marker
pub const ELLIPSIS: &str = "...";

/// Placeholder for missing values
pub const PLACEHOLDER: &str = "-";

/// Header of the action column
pub const ACTIONS_HEADER: &str = "Actions";

/// Custom value extractor for a column
pub type ValueFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// One table column
#[derive(Clone)]
pub struct ColumnSpec {
    /// Record field, also drives cell formatting
    pub key: String,
    /// Header text
    pub label: String,
    value: Option<ValueFn>,
}

impl ColumnSpec {
    /// Column reading `key`, headed by `label`
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: None,
        }
    }

    /// Column headed by its own key
    #[must_use]
    pub fn keyed(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(key.clone(), key)
    }

    /// Use a custom extractor instead of the field lookup
    #[must_use]
    pub fn with_value<F>(mut self, extract: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.value = Some(Arc::new(extract));
        self
    }

    /// Raw value of this column for a record; `null` when missing
    #[must_use]
    pub fn extract(&self, record: &Value) -> Value {
        match &self.value {
            Some(extract) => extract(record),
            None => record.get(&self.key).cloned().unwrap_or(Value::Null),
        }
    }
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("custom_value", &self.value.is_some())
            .finish()
    }
}

impl PartialEq for ColumnSpec {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.label == other.label
            && self.value.is_none() == other.value.is_none()
    }
}

/// Columns for records with no explicit layout
///
/// The first record's keys, up to [`MAX_INFERRED_COLUMNS`]. With no records,
/// a single `_id` column headed "ID".
#[must_use]
pub fn infer_columns(items: &[Value]) -> Vec<ColumnSpec> {
    match items.first() {
        None => vec![ColumnSpec::new("_id", "ID")],
        Some(first) => first
            .as_object()
            .map(|record| {
                record
                    .keys()
                    .take(MAX_INFERRED_COLUMNS)
                    .map(ColumnSpec::keyed)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Formatted cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Missing value
    Placeholder,
    /// Status badge
    Tag(String),
    /// Structured value preview
    Code(String),
    /// Plain scalar text
    Text(String),
}

impl Cell {
    /// Unescaped display text
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Placeholder => PLACEHOLDER,
            Self::Tag(text) | Self::Code(text) | Self::Text(text) => text,
        }
    }

    /// Markup with every text node escaped
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Placeholder => PLACEHOLDER.to_string(),
            Self::Tag(text) => format!("<span class=\"tag\">{}</span>", escape_html(text)),
            Self::Code(text) => format!("<code>{}</code>", escape_html(text)),
            Self::Text(text) => escape_html(text),
        }
    }
}

/// Whether a column key holds a status
#[must_use]
pub fn is_status_key(key: &str) -> bool {
    key == "status" || key.ends_with("_status")
}

/// Format one raw value for column `key`
#[must_use]
pub fn format_cell(key: &str, value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Placeholder,
        _ if is_status_key(key) => Cell::Tag(scalar_text(value)),
        Value::Array(_) | Value::Object(_) => {
            Cell::Code(value.to_string().chars().take(MAX_CELL_CHARS).collect())
        }
        _ => {
            let text = scalar_text(value);
            if text.chars().count() > MAX_CELL_CHARS {
                let mut cut: String = text.chars().take(TRUNCATED_CHARS).collect();
                cut.push_str(ELLIPSIS);
                Cell::Text(cut)
            } else {
                Cell::Text(text)
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape `& < > " '` for markup
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Escape control characters so backend text cannot drive the terminal
#[must_use]
pub fn escape_terminal(text: &str) -> String {
    text.chars()
        .flat_map(|c| {
            if c.is_control() {
                c.escape_default().collect::<Vec<_>>()
            } else {
                vec![c]
            }
        })
        .collect()
}

/// Future returned by an action handler
pub type ActionFuture = BoxFuture<'static, ExplorerResult<Value>>;

type ActionHandler = Arc<dyn Fn(Value) -> ActionFuture + Send + Sync>;

/// Labelled per-row operation
#[derive(Clone)]
pub struct RowAction {
    /// Button label
    pub label: String,
    handler: ActionHandler,
}

impl RowAction {
    /// Create action from an async handler over the row record
    pub fn new<F, Fut>(label: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ExplorerResult<Value>> + Send + 'static,
    {
        Self {
            label: label.into(),
            handler: Arc::new(move |row| -> ActionFuture { Box::pin(handler(row)) }),
        }
    }

    /// Run the handler for one row
    #[must_use]
    pub fn run(&self, row: Value) -> ActionFuture {
        (self.handler)(row)
    }
}

impl fmt::Debug for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Settled row action
#[derive(Debug)]
pub struct ActionOutcome {
    /// `_id` of the row, when present
    pub row_id: Option<String>,
    /// Label of the action that ran
    pub label: String,
    /// Row record it ran on
    pub row: Value,
    /// Handler result
    pub result: ExplorerResult<Value>,
}

/// One rendered row
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Source record
    pub record: Value,
    /// Cells in column order
    pub cells: Vec<Cell>,
}

/// Rendered table
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<ColumnSpec>,
    rows: Vec<TableRow>,
    actions: Vec<RowAction>,
}

impl Table {
    /// Render records with explicit or inferred columns
    #[must_use]
    pub fn render(columns: Option<&[ColumnSpec]>, items: &[Value], actions: Vec<RowAction>) -> Self {
        let columns = match columns {
            Some(columns) => columns.to_vec(),
            None => infer_columns(items),
        };
        let rows = items
            .iter()
            .map(|record| TableRow {
                cells: columns
                    .iter()
                    .map(|column| format_cell(&column.key, &column.extract(record)))
                    .collect(),
                record: record.clone(),
            })
            .collect();
        Self {
            columns,
            rows,
            actions,
        }
    }

    /// Columns in display order
    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Header texts, with the action column when actions exist
    #[must_use]
    pub fn headers(&self) -> Vec<&str> {
        let mut headers: Vec<&str> = self.columns.iter().map(|c| c.label.as_str()).collect();
        if !self.actions.is_empty() {
            headers.push(ACTIONS_HEADER);
        }
        headers
    }

    /// Rendered rows
    #[must_use]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Row actions
    #[must_use]
    pub fn actions(&self) -> &[RowAction] {
        &self.actions
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the action labelled `label`, ignoring case
    #[must_use]
    pub fn find_action(&self, label: &str) -> Option<usize> {
        self.actions
            .iter()
            .position(|action| action.label.eq_ignore_ascii_case(label))
    }

    /// Start an action on a row
    ///
    /// The handler runs on the tokio runtime; `on_settle` is called once it
    /// finishes, whether it succeeded or failed. Must be called from within
    /// a runtime.
    pub fn invoke<F>(&self, row: usize, action: usize, on_settle: F) -> ExplorerResult<JoinHandle<()>>
    where
        F: FnOnce(ActionOutcome) + Send + 'static,
    {
        let record = self
            .rows
            .get(row)
            .map(|r| r.record.clone())
            .ok_or_else(|| ExplorerError::InvalidSelection(format!("no row {row}")))?;
        let action = self
            .actions
            .get(action)
            .cloned()
            .ok_or_else(|| ExplorerError::InvalidSelection(format!("no action {action}")))?;

        debug!(label = %action.label, row, "invoking row action");
        Ok(tokio::spawn(async move {
            let result = action.run(record.clone()).await;
            on_settle(ActionOutcome {
                row_id: record_id(&record),
                label: action.label,
                row: record,
                result,
            });
        }))
    }

    /// Markup table; all backend text is escaped
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::from("<table><thead><tr>");
        for header in self.headers() {
            let _ = write!(html, "<th>{}</th>", escape_html(header));
        }
        html.push_str("</tr></thead><tbody>");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in &row.cells {
                let _ = write!(html, "<td>{}</td>", cell.to_html());
            }
            if !self.actions.is_empty() {
                html.push_str("<td><div class=\"actions\">");
                for action in &self.actions {
                    let _ = write!(
                        html,
                        "<button type=\"button\">{}</button>",
                        escape_html(&action.label)
                    );
                }
                html.push_str("</div></td>");
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");
        html
    }

    /// Aligned plain-text table; control characters are escaped
    #[must_use]
    pub fn to_text(&self) -> String {
        let action_cell = self
            .actions
            .iter()
            .map(|a| escape_terminal(&a.label))
            .collect::<Vec<_>>()
            .join(" | ");

        let mut lines: Vec<Vec<String>> = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.headers().into_iter().map(escape_terminal).collect());
        for row in &self.rows {
            let mut line: Vec<String> = row.cells.iter().map(|c| escape_terminal(c.text())).collect();
            if !self.actions.is_empty() {
                line.push(action_cell.clone());
            }
            lines.push(line);
        }

        let width_count = lines.first().map_or(0, Vec::len);
        let widths: Vec<usize> = (0..width_count)
            .map(|i| {
                lines
                    .iter()
                    .filter_map(|line| line.get(i))
                    .map(|text| text.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        for line in &lines {
            let padded: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(text, width)| format!("{text:<width$}"))
                .collect();
            out.push_str(padded.join("  ").trim_end());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn infers_first_seven_keys() {
        let items = vec![json!({"a": 1, "b": 2, "c": 3, "d": 4, "e": 5, "f": 6, "g": 7, "h": 8})];
        let keys: Vec<String> = infer_columns(&items).into_iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d", "e", "f", "g"]);
    }

    #[test]
    fn no_items_gives_id_column() {
        assert_eq!(infer_columns(&[]), vec![ColumnSpec::new("_id", "ID")]);
    }

    #[test]
    fn empty_record_gives_no_columns() {
        assert!(infer_columns(&[json!({})]).is_empty());
    }

    #[test]
    fn cell_formatting() {
        assert_eq!(format_cell("domain", &Value::Null), Cell::Placeholder);
        assert_eq!(format_cell("status", &json!("done")), Cell::Tag("done".into()));
        assert_eq!(format_cell("task_status", &json!(3)), Cell::Tag("3".into()));
        assert_eq!(format_cell("ports", &json!([80, 443])), Cell::Code("[80,443]".into()));
        assert_eq!(format_cell("port", &json!(80)), Cell::Text("80".into()));
        assert_eq!(format_cell("ok", &json!(false)), Cell::Text("false".into()));
    }

    #[test]
    fn long_text_is_truncated() {
        let text = "x".repeat(130);
        let Cell::Text(cut) = format_cell("title", &json!(text)) else {
            panic!("expected text cell");
        };
        assert_eq!(cut.chars().count(), 120);
        assert!(cut.ends_with(ELLIPSIS));

        let exact = "y".repeat(120);
        assert_eq!(format_cell("title", &json!(exact)), Cell::Text(exact));
    }

    #[test]
    fn long_structures_are_cut_without_marker() {
        let value = json!({"body": "z".repeat(200)});
        let Cell::Code(preview) = format_cell("headers", &value) else {
            panic!("expected code cell");
        };
        assert_eq!(preview.chars().count(), 120);
        assert!(preview.starts_with("{\"body\":\"zzz"));
    }

    #[test]
    fn markup_is_escaped() {
        let items = vec![json!({"title": "<script>alert('x')</script>", "status": "a&b"})];
        let html = Table::render(None, &items, Vec::new()).to_html();
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(html.contains("<span class=\"tag\">a&amp;b</span>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn text_output_escapes_control_characters() {
        let items = vec![json!({"banner": "ok\u{1b}[31mred\nline"})];
        let text = Table::render(None, &items, Vec::new()).to_text();
        assert!(!text.contains('\u{1b}'));
        assert!(text.contains("ok\\u{1b}[31mred\\nline"));
    }

    #[test]
    fn text_output_aligns_columns() {
        let columns = [ColumnSpec::new("name", "Name"), ColumnSpec::new("status", "Status")];
        let items = vec![json!({"name": "recon", "status": "done"}), json!({"name": "a"})];
        let text = Table::render(Some(&columns), &items, Vec::new()).to_text();
        assert_eq!(text, "Name   Status\nrecon  done\na      -\n");
    }

    #[test]
    fn custom_extractor() {
        let column = ColumnSpec::new("host", "Host")
            .with_value(|record| json!(format!("{}:{}", record["ip"].as_str().unwrap_or("-"), record["port"])));
        let table = Table::render(Some(&[column]), &[json!({"ip": "10.0.0.1", "port": 22})], Vec::new());
        assert_eq!(table.rows()[0].cells, vec![Cell::Text("10.0.0.1:22".into())]);
    }

    #[tokio::test]
    async fn action_settles_with_row_record() {
        let action = RowAction::new("Stop", |row: Value| async move { Ok(json!({"stopped": row["_id"]})) });
        let table = Table::render(None, &[json!({"_id": "t1"})], vec![action]);
        assert_eq!(table.headers(), vec!["_id", "Actions"]);
        assert_eq!(table.find_action("stop"), Some(0));

        let (tx, rx) = tokio::sync::oneshot::channel();
        let handle = table
            .invoke(0, 0, move |outcome| {
                let _ = tx.send(outcome);
            })
            .unwrap();
        handle.await.unwrap();

        let outcome = rx.await.unwrap();
        assert_eq!(outcome.label, "Stop");
        assert_eq!(outcome.row_id.as_deref(), Some("t1"));
        assert_eq!(outcome.row, json!({"_id": "t1"}));
        assert_eq!(outcome.result.unwrap(), json!({"stopped": "t1"}));
    }

    #[tokio::test]
    async fn failed_action_still_settles() {
        let action = RowAction::new("Delete", |_row: Value| async move {
            Err(ExplorerError::action("Delete", "refused"))
        });
        let table = Table::render(None, &[json!({"_id": "t1"})], vec![action]);

        let (tx, rx) = tokio::sync::oneshot::channel();
        table
            .invoke(0, 0, move |outcome| {
                let _ = tx.send(outcome);
            })
            .unwrap();
        assert!(rx.await.unwrap().result.is_err());
    }

    #[test]
    fn invoke_rejects_out_of_range_selection() {
        let table = Table::render(None, &[json!({"_id": "t1"})], Vec::new());
        let err = table.invoke(0, 0, |_| {}).unwrap_err();
        assert!(matches!(err, ExplorerError::InvalidSelection(_)));
    }
}
