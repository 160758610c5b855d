//! Gateway event model.

use crate::lifecycle::LifecycleError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// HTTP method enumeration, used as the route key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Every supported method.
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
        Method::Head,
        Method::Options,
    ];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                LifecycleError::configuration(format!("unsupported http method: {}", s))
            })
    }
}

const DERIVED_FIELDS: [&str; 3] = ["cookies", "jwt", "rawBody"];

/// A gateway request event after normalization.
///
/// Absent or `null` collections deserialize as empty maps, so handlers never
/// need to null-check them. Fields the engine does not know about are kept in
/// `extra` and survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    /// Raw method as sent by the gateway.
    #[serde(default)]
    pub http_method: Option<String>,
    /// Request path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Request headers.
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    /// Single-value query parameters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    /// Multi-value query parameters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,
    /// Path parameters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,
    /// Request body; decoded during preprocessing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// The body exactly as received, set when a body was decoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_body: Option<String>,
    /// Whether `body` is base64 encoded.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,
    /// Cookies parsed from the `Cookie` header.
    #[serde(default, skip_deserializing)]
    pub cookies: BTreeMap<String, String>,
    /// Claims attached by identity validation.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<Value>,
    /// Remaining event fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiEvent {
    /// Create an event for `method` and `path`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            http_method: Some(method.to_string()),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Add a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the raw body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Value::String(body.into()));
        self
    }

    /// Look up a header, ignoring case.
    pub fn get_header(&self, key: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    /// Deserialize the decoded body.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, LifecycleError> {
        let body = self.body.clone().unwrap_or(Value::Null);
        serde_json::from_value(body).map_err(|e| {
            LifecycleError::validation(format!("invalid body: {}", e), vec!["body".to_string()])
        })
    }

    /// Drop fields that only preprocessing may set, whatever the inbound
    /// event carried for them.
    pub(crate) fn clear_derived(&mut self) {
        for key in DERIVED_FIELDS {
            self.extra.remove(key);
        }
        self.raw_body = None;
        self.cookies.clear();
        self.jwt = None;
    }

    /// Convert to a JSON event.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_parse() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert!("TRACE".parse::<Method>().unwrap_err().is_configuration());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_null_collections_become_empty() {
        let event: ApiEvent = serde_json::from_value(json!({
            "httpMethod": "GET",
            "queryStringParameters": null,
            "pathParameters": null,
            "headers": null,
        }))
        .unwrap();

        assert!(event.query_string_parameters.is_empty());
        assert!(event.multi_value_query_string_parameters.is_empty());
        assert!(event.path_parameters.is_empty());
        assert!(event.headers.is_empty());
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let event: ApiEvent = serde_json::from_value(json!({
            "httpMethod": "GET",
            "requestContext": {"stage": "prod"},
        }))
        .unwrap();

        assert_eq!(event.extra["requestContext"], json!({"stage": "prod"}));
        assert_eq!(event.to_value()["requestContext"]["stage"], "prod");
    }

    #[test]
    fn test_cookies_not_read_from_event() {
        let event: ApiEvent = serde_json::from_value(json!({
            "httpMethod": "GET",
            "cookies": ["a=b"],
        }))
        .unwrap();
        assert!(event.cookies.is_empty());
    }

    #[test]
    fn test_clear_derived_drops_inbound_values() {
        let mut event: ApiEvent = serde_json::from_value(json!({
            "httpMethod": "GET",
            "cookies": ["a=b"],
            "jwt": "forged",
            "rawBody": "planted",
            "requestContext": {"stage": "prod"},
        }))
        .unwrap();
        event.clear_derived();

        let value = event.to_value();
        assert!(value.get("jwt").is_none());
        assert!(value.get("rawBody").is_none());
        assert_eq!(value["cookies"], json!({}));
        assert_eq!(value["requestContext"]["stage"], "prod");
        assert_eq!(serde_json::to_string(&event).unwrap().matches("\"cookies\"").count(), 1);
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let event = ApiEvent::new(Method::Get, "/").header("Content-Type", "text/plain");
        assert_eq!(event.get_header("content-type"), Some(&"text/plain".to_string()));
    }

    #[test]
    fn test_body_as() {
        #[derive(Deserialize)]
        struct Item {
            id: u32,
        }

        let mut event = ApiEvent::new(Method::Post, "/");
        event.body = Some(json!({"id": 7}));
        assert_eq!(event.body_as::<Item>().unwrap().id, 7);

        event.body = Some(json!("text"));
        assert!(event.body_as::<Item>().is_err());
    }
}
