//! Response envelopes and the shaping of results and errors into them.

use crate::lifecycle::{Context, LifecycleError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Ordered header map, so shaped envelopes serialize identically.
pub type Headers = BTreeMap<String, String>;

const RESPONSE_FIELDS: [&str; 4] = ["statusCode", "headers", "body", "isBase64Encoded"];

/// Gateway response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// HTTP status code.
    pub status_code: u16,
    /// HTTP headers.
    pub headers: Headers,
    /// Serialized body.
    pub body: String,
    /// Whether `body` is base64 encoded.
    pub is_base64_encoded: bool,
}

impl Response {
    /// Create an empty response with the given status code.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: Headers::new(),
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    /// Add a header to the response.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the response body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Add every header in `headers`, replacing existing values.
    pub fn headers(self, headers: &Headers) -> Self {
        headers
            .iter()
            .fold(self, |response, (key, value)| response.header(key, value))
    }

    /// Convert to a JSON value.
    pub fn to_value(&self) -> Result<Value, LifecycleError> {
        serde_json::to_value(self).map_err(|e| LifecycleError::Shaping(e.to_string()))
    }
}

/// Shape a business result.
///
/// A JSON object carrying any of `statusCode`, `headers`, `body` or
/// `isBase64Encoded` is read as a response object; anything else becomes the
/// body of a 200 response. Response headers override configured ones.
pub fn process_result(
    result: Value,
    context: &Context,
    headers: &Headers,
) -> Result<Response, LifecycleError> {
    let is_response_object = result
        .as_object()
        .is_some_and(|fields| RESPONSE_FIELDS.iter().any(|f| fields.contains_key(*f)));

    let mut response = Response::new(200).headers(headers);

    if is_response_object {
        if let Some(code) = result.get("statusCode") {
            response.status_code = code
                .as_u64()
                .and_then(|c| u16::try_from(c).ok())
                .filter(|c| (100..600).contains(c))
                .ok_or_else(|| {
                    LifecycleError::Shaping(format!("invalid status code: {}", code))
                })?;
        }
        if let Some(Value::Object(extra)) = result.get("headers") {
            for (name, value) in extra {
                if let Some(value) = header_text(value) {
                    response = response.header(name, value);
                }
            }
        }
        response = response.body(body_text(result.get("body").unwrap_or(&Value::Null))?);
        response.is_base64_encoded = result
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false);
    } else {
        response = response.body(body_text(&result)?);
    }

    debug!(
        "Shaped result with status {} [{}]",
        response.status_code, context.request_id
    );
    Ok(response)
}

/// Shape an error into a response carrying its status, type and message.
pub fn process_error(error: &LifecycleError, headers: &Headers) -> Response {
    let mut body = json!({
        "type": error.kind(),
        "message": error.to_string(),
    });
    if !error.fields().is_empty() {
        body["fields"] = json!(error.fields());
    }

    Response::new(error.status_code())
        .headers(headers)
        .body(body.to_string())
}

/// Textual header value; `None` for values that should not be sent.
pub(crate) fn header_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn body_text(body: &Value) -> Result<String, LifecycleError> {
    match body {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        other => serde_json::to_string(other).map_err(|e| LifecycleError::Shaping(e.to_string())),
    }
}
