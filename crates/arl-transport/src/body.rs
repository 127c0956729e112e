//! Response body decoding and classification

use crate::error::FALLBACK_MESSAGE;
use serde_json::Value;

/// Parse a body as JSON, falling back to the raw text as a string value
#[must_use]
pub fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Loose truthiness used by the backend's conventions
///
/// `null`, `false`, `0`, `""` are falsy; everything else, including empty
/// arrays and objects, is truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Message of an application-level error embedded in a success response
///
/// A body is a soft error when it is an object whose `code` is truthy and
/// not `200`.
#[must_use]
pub fn soft_error_message(body: &Value) -> Option<String> {
    let code = body.as_object()?.get("code")?;
    if !is_truthy(code) || code.as_f64() == Some(200.0) {
        return None;
    }
    Some(message_field(body).unwrap_or_else(|| FALLBACK_MESSAGE.to_string()))
}

/// Message for a non-success response body
#[must_use]
pub fn failure_message(body: &Value) -> String {
    match body {
        Value::String(text) if !text.is_empty() => text.clone(),
        other => message_field(other).unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
    }
}

fn message_field(body: &Value) -> Option<String> {
    match body.get("message")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_falls_back_to_text() {
        assert_eq!(parse_body(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body("<html>oops</html>"), json!("<html>oops</html>"));
        assert_eq!(parse_body(""), json!(""));
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!("0")));
    }

    #[test]
    fn soft_error_detection() {
        assert_eq!(
            soft_error_message(&json!({"code": 401, "message": "token expired"})),
            Some("token expired".to_string())
        );
        assert_eq!(
            soft_error_message(&json!({"code": 500})),
            Some(FALLBACK_MESSAGE.to_string())
        );
        assert_eq!(soft_error_message(&json!({"code": 200, "message": "ok"})), None);
        assert_eq!(soft_error_message(&json!({"code": 0})), None);
        assert_eq!(soft_error_message(&json!({"items": []})), None);
        assert_eq!(soft_error_message(&json!([1, 2])), None);
    }

    #[test]
    fn failure_message_sources() {
        assert_eq!(failure_message(&json!("Bad Gateway")), "Bad Gateway");
        assert_eq!(failure_message(&json!({"message": "denied"})), "denied");
        assert_eq!(failure_message(&json!({"detail": "x"})), FALLBACK_MESSAGE);
        assert_eq!(failure_message(&json!("")), FALLBACK_MESSAGE);
    }
}
