//! Gateway handler configuration.

use crate::api::body::BodyEncoding;
use crate::api::protection::{ProtectionMode, ProtectionOptions};
use crate::api::response::Headers;
use serde::{Deserialize, Serialize};

/// Options seeding an [`ApiHandlerBuilder`](crate::api::ApiHandlerBuilder).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiOptions {
    /// Headers added to every response.
    pub headers: Headers,
    /// Body decoding mode.
    pub body_encoding: BodyEncoding,
    /// Injection scanning.
    pub protection: ProtectionOptions,
    /// Explicit wait-for-empty-loop setting, if any.
    pub callback_waits_for_empty_event_loop: Option<bool>,
}

impl ApiOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body encoding.
    pub fn body_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.body_encoding = encoding;
        self
    }

    /// Set the protection mode.
    pub fn protection(mut self, mode: ProtectionMode) -> Self {
        self.protection = ProtectionOptions::new(mode);
        self
    }

    /// Set the wait-for-empty-loop flag.
    pub fn callback_waits_for_empty_event_loop(mut self, enabled: bool) -> Self {
        self.callback_waits_for_empty_event_loop = Some(enabled);
        self
    }
}

/// Cross-origin response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorsOptions {
    pub allow_origin: Option<String>,
    pub allow_credentials: Option<bool>,
    pub expose_headers: Vec<String>,
    pub max_age: Option<u64>,
    pub allow_headers: Vec<String>,
}

impl CorsOptions {
    /// Header name/value pairs for the options that are set.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let list = |values: &[String]| (!values.is_empty()).then(|| values.join(", "));

        [
            ("Access-Control-Allow-Origin", self.allow_origin.clone()),
            (
                "Access-Control-Allow-Credentials",
                self.allow_credentials.map(|b| b.to_string()),
            ),
            ("Access-Control-Expose-Headers", list(&self.expose_headers)),
            ("Access-Control-Max-Age", self.max_age.map(|s| s.to_string())),
            ("Access-Control-Allow-Headers", list(&self.allow_headers)),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_json() {
        let options: ApiOptions = serde_json::from_str(
            r#"{
                "headers": {"X-Service": "items"},
                "bodyEncoding": "none",
                "protection": {"mode": "fail"}
            }"#,
        )
        .unwrap();

        assert_eq!(options.headers["X-Service"], "items");
        assert_eq!(options.body_encoding, BodyEncoding::None);
        assert_eq!(options.protection.mode, ProtectionMode::Fail);
        assert_eq!(options.callback_waits_for_empty_event_loop, None);
    }

    #[test]
    fn test_options_defaults() {
        let options = ApiOptions::new();
        assert_eq!(options.body_encoding, BodyEncoding::Auto);
        assert_eq!(options.protection.mode, ProtectionMode::Report);
        assert!(options.headers.is_empty());
    }

    #[test]
    fn test_cors_headers() {
        let cors = CorsOptions {
            allow_origin: Some("*".into()),
            allow_credentials: Some(true),
            allow_headers: vec!["Content-Type".into(), "Authorization".into()],
            ..CorsOptions::default()
        };

        assert_eq!(
            cors.headers(),
            vec![
                ("Access-Control-Allow-Origin", "*".to_string()),
                ("Access-Control-Allow-Credentials", "true".to_string()),
                (
                    "Access-Control-Allow-Headers",
                    "Content-Type, Authorization".to_string()
                ),
            ]
        );
    }
}
