//! URL joining and query-string encoding

use indexmap::IndexMap;
use serde_json::Value;

/// Join a base URL and a path with exactly one separator
///
/// Trailing slashes on the base and leading slashes on the path are
/// dropped before joining; a trailing slash on the path is kept because
/// the backend routes on it.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Insertion-ordered query parameters
///
/// Setting an existing key replaces its value in place. Null and empty
/// string values are kept in the map but never encoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    inner: IndexMap<String, Value>,
}

impl QueryParams {
    /// Empty parameter set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value for the key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.inner.insert(key.into(), value.into());
        self
    }

    /// Builder-style [`set`](Self::set)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Merge another set on top of this one; the other set wins on conflicts
    pub fn merge(&mut self, other: QueryParams) -> &mut Self {
        for (key, value) in other.inner {
            self.inner.insert(key, value);
        }
        self
    }

    /// Value for a key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    /// Number of stored keys, encodable or not
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no keys are stored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate stored pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode as `application/x-www-form-urlencoded`, skipping blank values
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.inner {
            if let Some(text) = encode_value(value) {
                serializer.append_pair(key, &text);
            }
        }
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

fn encode_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
