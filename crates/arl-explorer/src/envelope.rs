//! List envelope normalization
//!
//! Collection endpoints answer in one of four shapes:
//!
//! ```text
//! [ ... ]                              bare sequence
//! { "items": [...], "total": n }       flat envelope
//! { "data": { "items": [...], ... } }  nested envelope
//! { "data": [ ... ] }                  data sequence
//! ```
//!
//! [`normalize`] folds every one of them into a [`ListEnvelope`] and never
//! fails: anything unrecognized becomes the empty envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical collection page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListEnvelope {
    /// Records on this page
    pub items: Vec<Value>,
    /// Backend-reported total, or the page length when absent
    ///
    /// Not guaranteed to be `>= items.len()`.
    pub total: u64,
}

impl ListEnvelope {
    /// Envelope counting its own items
    #[must_use]
    pub fn from_items(items: Vec<Value>) -> Self {
        let total = items.len() as u64;
        Self { items, total }
    }

    /// Whether the page holds no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Canonicalize any backend response into `{items, total}`
///
/// First match wins: bare sequence, `items`, `data.items`, `data` as
/// sequence, then the empty envelope.
#[must_use]
pub fn normalize(response: &Value) -> ListEnvelope {
    match response {
        Value::Array(items) => ListEnvelope::from_items(items.clone()),
        Value::Object(object) => normalize_object(object),
        _ => ListEnvelope::default(),
    }
}

fn normalize_object(object: &Map<String, Value>) -> ListEnvelope {
    if let Some(envelope) = items_envelope(object) {
        return envelope;
    }
    match object.get("data") {
        Some(Value::Object(data)) => items_envelope(data).unwrap_or_default(),
        Some(Value::Array(items)) => ListEnvelope::from_items(items.clone()),
        _ => ListEnvelope::default(),
    }
}

fn items_envelope(object: &Map<String, Value>) -> Option<ListEnvelope> {
    let items = object.get("items")?.as_array()?.clone();
    let total = object
        .get("total")
        .and_then(total_value)
        .unwrap_or(items.len() as u64);
    Some(ListEnvelope { items, total })
}

// Zero counts as absent.
fn total_value(value: &Value) -> Option<u64> {
    let total = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 1.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (total > 0).then_some(total)
}
