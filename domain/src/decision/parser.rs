//! Structured object extraction from free-text model output.
//!
//! Models are asked to answer with a bare JSON object, but routinely wrap it
//! in prose or code fences. [`extract_object`] recovers the object and the
//! `require_*` helpers validate individual keys without coercing types.

use serde_json::{Map, Value};
use thiserror::Error;

/// A JSON object recovered from model output.
pub type JsonObject = Map<String, Value>;

/// Why raw model output could not be turned into a decision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionParseError {
    #[error("no parseable object found")]
    NoObjectFound,

    #[error("missing required key '{0}'")]
    MissingKey(String),

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl DecisionParseError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Recover a JSON object from raw model text.
///
/// 1. The whole (trimmed) text is parsed as an object.
/// 2. Otherwise the first balanced `{ ... }` substring is parsed. Braces
///    inside JSON string literals do not count towards the balance.
pub fn extract_object(raw: &str) -> Result<JsonObject, DecisionParseError> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw.trim()) {
        return Ok(map);
    }

    let candidate = first_balanced_object(raw).ok_or(DecisionParseError::NoObjectFound)?;
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(DecisionParseError::NoObjectFound),
    }
}

/// Find the first balanced brace-delimited substring.
///
/// A `{` that never closes does not hide a balanced object after it: the
/// scan restarts from the next `{`.
fn first_balanced_object(text: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(found) = text[from..].find('{') {
        let start = from + found;
        if let Some(end) = balanced_end(&text[start..]) {
            return Some(&text[start..start + end]);
        }
        from = start + 1;
    }
    None
}

/// Byte length of the object opening at the start of `text`, if it closes.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Verify every key is present and not `null`.
pub fn require_keys(object: &JsonObject, keys: &[&str]) -> Result<(), DecisionParseError> {
    for key in keys {
        match object.get(*key) {
            None | Some(Value::Null) => return Err(DecisionParseError::MissingKey(key.to_string())),
            Some(_) => {}
        }
    }
    Ok(())
}

/// A required string that must be non-empty after trimming.
pub fn require_non_empty_str<'a>(
    value: Option<&'a Value>,
    key: &str,
) -> Result<&'a str, DecisionParseError> {
    match value {
        None | Some(Value::Null) => Err(DecisionParseError::MissingKey(key.to_string())),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) => Err(DecisionParseError::invalid(
            key,
            "must be a non-empty string",
        )),
        Some(other) => Err(DecisionParseError::invalid(
            key,
            format!("expected a string, got {}", json_type_name(other)),
        )),
    }
}

/// An optional string. `null` and blank strings read as absent.
pub fn optional_str<'a>(
    value: Option<&'a Value>,
    key: &str,
) -> Result<Option<&'a str>, DecisionParseError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(DecisionParseError::invalid(
            key,
            format!("expected a string, got {}", json_type_name(other)),
        )),
    }
}

/// An optional array of strings. `null` reads as absent.
pub fn optional_str_array(
    value: Option<&Value>,
    key: &str,
) -> Result<Option<Vec<String>>, DecisionParseError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(DecisionParseError::invalid(
                key,
                format!("expected an array, got {}", json_type_name(other)),
            ));
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(DecisionParseError::invalid(
                format!("{}[{}]", key, i),
                format!("expected a string, got {}", json_type_name(other)),
            )),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_whole_string() {
        let obj = extract_object(r#"  {"a": 1}  "#).unwrap();
        assert_eq!(obj.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_extract_from_prose_and_fences() {
        let raw = "Sure! Here it is:\n```json\n{\"strategy\": \"direct_execution\", \"rationale\": \"small\"}\n```\nAnything else?";
        let obj = extract_object(raw).unwrap();
        assert_eq!(obj.get("strategy"), Some(&json!("direct_execution")));
    }

    #[test]
    fn test_extract_ignores_braces_in_strings() {
        let raw = r#"Answer: {"rationale": "use a } brace and \" quote", "n": {"x": 1}} trailing }"#;
        let obj = extract_object(raw).unwrap();
        assert_eq!(obj.get("rationale"), Some(&json!("use a } brace and \" quote")));
        assert_eq!(obj.get("n"), Some(&json!({"x": 1})));
    }

    #[test]
    fn test_extract_first_object_only() {
        let raw = r#"first {"a": 1} second {"b": 2}"#;
        let obj = extract_object(raw).unwrap();
        assert!(obj.contains_key("a"));
        assert!(!obj.contains_key("b"));
    }

    #[test]
    fn test_extract_skips_unclosed_brace_in_prose() {
        let raw = r#"Using set notation {a, b here is the answer: {"strategy": "direct_execution", "rationale": "small"}"#;
        let obj = extract_object(raw).unwrap();
        assert_eq!(obj.get("strategy"), Some(&json!("direct_execution")));
    }

    #[test]
    fn test_extract_failures() {
        assert_eq!(extract_object("no json here"), Err(DecisionParseError::NoObjectFound));
        assert_eq!(extract_object("{ unbalanced"), Err(DecisionParseError::NoObjectFound));
        assert_eq!(extract_object("{not: json}"), Err(DecisionParseError::NoObjectFound));
        assert_eq!(extract_object("[1, 2]"), Err(DecisionParseError::NoObjectFound));
    }

    #[test]
    fn test_require_keys() {
        let obj = extract_object(r#"{"a": 1, "b": null}"#).unwrap();
        assert!(require_keys(&obj, &["a"]).is_ok());
        assert_eq!(
            require_keys(&obj, &["a", "b"]),
            Err(DecisionParseError::MissingKey("b".into()))
        );
        assert_eq!(
            require_keys(&obj, &["c"]).unwrap_err().to_string(),
            "missing required key 'c'"
        );
    }

    #[test]
    fn test_require_non_empty_str_rejects_wrong_types() {
        let v = json!(42);
        let err = require_non_empty_str(Some(&v), "rationale").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for 'rationale': expected a string, got number"
        );
        let blank = json!("   ");
        assert!(require_non_empty_str(Some(&blank), "rationale").is_err());
    }

    #[test]
    fn test_optional_str_array() {
        let v = json!(["s1", "s2"]);
        assert_eq!(
            optional_str_array(Some(&v), "depends_on").unwrap(),
            Some(vec!["s1".to_string(), "s2".to_string()])
        );
        assert_eq!(optional_str_array(None, "depends_on").unwrap(), None);

        let not_array = json!("s1");
        assert!(optional_str_array(Some(&not_array), "depends_on").is_err());

        let mixed = json!(["s1", 2]);
        let err = optional_str_array(Some(&mixed), "depends_on").unwrap_err();
        assert!(err.to_string().contains("depends_on[1]"));
    }
}
