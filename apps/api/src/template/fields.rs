//! Field Mapping — the caller-supplied data bound to a template for one render.

use serde_json::{Map, Value};

use crate::errors::AppError;

pub const LOGO_FIELD: &str = "logo_url";
/// Element form of the resolved logo (`<img>` or fallback markup).
pub const LOGO_BLOCK_FIELD: &str = "logo";

/// Ordered mapping from field name to raw JSON value.
/// Display strings are produced on demand by [`display_value`].
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    fields: Map<String, Value>,
}

impl FieldMapping {
    /// Parses a request body. Anything other than a JSON object is rejected.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, AppError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidInput(format!("request body is not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(AppError::InvalidInput(format!(
                "field mapping must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Display string for a present key; `None` only when the key is absent.
    pub fn display(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(display_value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Caller-supplied logo address. An empty or whitespace-only value counts as absent.
    pub fn logo_url(&self) -> Option<String> {
        self.display(LOGO_FIELD)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Total stringification: null → "", strings verbatim, numbers and booleans in
/// their natural form, arrays joined with `,`, objects as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: Value) -> FieldMapping {
        FieldMapping::from_value(value).unwrap()
    }

    #[test]
    fn test_display_value_is_total() {
        assert_eq!(display_value(&json!(null)), "");
        assert_eq!(display_value(&json!("$375,000")), "$375,000");
        assert_eq!(display_value(&json!(8.25)), "8.25");
        assert_eq!(display_value(&json!(710)), "710");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!([1, "a", null])), "1,a,");
        assert_eq!(display_value(&json!({"k": 1})), "{\"k\":1}");
    }

    #[test]
    fn test_non_object_body_is_invalid_input() {
        let bodies: [&[u8]; 4] = [b"[1,2]", b"\"text\"", b"42", b"null"];
        for body in bodies {
            let err = FieldMapping::from_json_slice(body).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "body {body:?}");
        }
    }

    #[test]
    fn test_malformed_json_is_invalid_input() {
        let err = FieldMapping::from_json_slice(b"{\"a\": ").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_display_distinguishes_absent_from_null() {
        let m = mapping(json!({"a": null}));
        assert_eq!(m.display("a"), Some(String::new()));
        assert_eq!(m.display("b"), None);
        assert!(m.contains("a"));
        assert!(!m.contains("b"));
    }

    #[test]
    fn test_empty_logo_url_counts_as_absent() {
        assert_eq!(mapping(json!({"logo_url": ""})).logo_url(), None);
        assert_eq!(mapping(json!({"logo_url": "   "})).logo_url(), None);
        assert_eq!(mapping(json!({"logo_url": null})).logo_url(), None);
        assert_eq!(
            mapping(json!({"logo_url": " https://cdn.test/l.png "})).logo_url(),
            Some("https://cdn.test/l.png".to_string())
        );
    }

    #[test]
    fn test_keys_preserve_insertion_order() {
        let m = FieldMapping::from_json_slice(br#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(m.len(), 3);
    }
}
