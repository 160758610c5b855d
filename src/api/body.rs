//! Request body decoding.

use crate::lifecycle::LifecycleError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How request bodies are decoded before validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyEncoding {
    /// JSON when the body looks like JSON, form fields when it parses as
    /// such, the raw string otherwise.
    #[default]
    Auto,
    /// Always decode as `application/x-www-form-urlencoded`.
    FormUrlEncoded,
    /// Leave the body untouched.
    None,
}

/// Decode a raw body according to `encoding`.
pub fn decode_body(
    raw: &str,
    is_base64_encoded: bool,
    encoding: BodyEncoding,
) -> Result<Value, LifecycleError> {
    if encoding == BodyEncoding::None {
        return Ok(Value::String(raw.to_string()));
    }

    let text = if is_base64_encoded {
        let bytes = STANDARD
            .decode(raw.trim())
            .map_err(|e| LifecycleError::decoding(format!("invalid base64 body: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|_| LifecycleError::decoding("base64 body is not valid utf-8"))?
    } else {
        raw.to_string()
    };

    match encoding {
        BodyEncoding::FormUrlEncoded => decode_form(&text),
        _ => decode_auto(text),
    }
}

fn decode_auto(text: String) -> Result<Value, LifecycleError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return serde_json::from_str(&text)
            .map_err(|e| LifecycleError::decoding(format!("invalid JSON body: {}", e)));
    }

    if text.contains('=') {
        if let Ok(form) = decode_form(&text) {
            return Ok(form);
        }
    }

    Ok(Value::String(text))
}

fn decode_form(text: &str) -> Result<Value, LifecycleError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(text)
        .map_err(|e| LifecycleError::decoding(format!("invalid form body: {}", e)))?;

    let mut fields = Map::new();
    for (key, value) in pairs {
        match fields.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                fields.insert(key, Value::String(value));
            }
        }
    }
    Ok(Value::Object(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auto_json() {
        let body = decode_body(r#"{"id": 1}"#, false, BodyEncoding::Auto).unwrap();
        assert_eq!(body, json!({"id": 1}));
    }

    #[test]
    fn test_auto_malformed_json() {
        let err = decode_body("{oops", false, BodyEncoding::Auto).unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert!(matches!(err, LifecycleError::Decoding(_)));
    }

    #[test]
    fn test_auto_form() {
        let body = decode_body("name=Ann&tag=a&tag=b", false, BodyEncoding::Auto).unwrap();
        assert_eq!(body, json!({"name": "Ann", "tag": ["a", "b"]}));
    }

    #[test]
    fn test_auto_plain_text() {
        let body = decode_body("hello", false, BodyEncoding::Auto).unwrap();
        assert_eq!(body, json!("hello"));
    }

    #[test]
    fn test_forced_form() {
        let body = decode_body("a=1&b=two%20words", false, BodyEncoding::FormUrlEncoded).unwrap();
        assert_eq!(body, json!({"a": "1", "b": "two words"}));
    }

    #[test]
    fn test_none_skips() {
        let body = decode_body(r#"{"id": 1}"#, false, BodyEncoding::None).unwrap();
        assert_eq!(body, json!(r#"{"id": 1}"#));
    }

    #[test]
    fn test_base64() {
        let encoded = STANDARD.encode(r#"{"id": 2}"#);
        let body = decode_body(&encoded, true, BodyEncoding::Auto).unwrap();
        assert_eq!(body, json!({"id": 2}));

        assert!(decode_body("***", true, BodyEncoding::Auto).is_err());
    }

    #[test]
    fn test_encoding_config_names() {
        let encoding: BodyEncoding = serde_json::from_str("\"form_url_encoded\"").unwrap();
        assert_eq!(encoding, BodyEncoding::FormUrlEncoded);
    }
}
