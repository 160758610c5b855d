//! Injection scanning of inbound events.

use crate::api::event::ApiEvent;
use crate::lifecycle::LifecycleError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::warn;

/// What to do when a scan finds a suspicious value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionMode {
    /// Log the detection and continue.
    #[default]
    Report,
    /// Reject the event.
    Fail,
    /// Do not scan.
    Disabled,
}

/// Protection scanner configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionOptions {
    /// Detection behaviour.
    pub mode: ProtectionMode,
}

impl ProtectionOptions {
    /// Options with the given mode.
    pub fn new(mode: ProtectionMode) -> Self {
        Self { mode }
    }
}

/// Scans an event for disallowed patterns.
pub trait SecurityScanner: Send + Sync {
    fn validate(&self, event: &ApiEvent) -> Result<(), LifecycleError>;
}

static SQL_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("comment sequence", r"'\s*(--|#|/\*)"),
        ("tautology", r"(?i)'\s*or\s+'?\w+'?\s*=\s*'?\w+"),
        ("union select", r"(?i)\bunion\b(\s+all)?\s+select\b"),
        (
            "stacked statement",
            r"(?i);\s*(drop|delete|insert|update|alter|create|truncate|exec)\b",
        ),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid SQL pattern")))
    .collect()
});

/// SQL injection scanner over query, path and body values.
#[derive(Debug, Clone, Default)]
pub struct Protection {
    options: ProtectionOptions,
}

impl Protection {
    /// Create a scanner.
    pub fn new(options: ProtectionOptions) -> Self {
        Self { options }
    }

    fn scan(&self, event: &ApiEvent) -> Option<(String, &'static str)> {
        let mut values: Vec<(String, &str)> = Vec::new();
        for (name, value) in &event.query_string_parameters {
            values.push((format!("queryStringParameters.{}", name), value));
        }
        for (name, list) in &event.multi_value_query_string_parameters {
            for value in list {
                values.push((format!("multiValueQueryStringParameters.{}", name), value));
            }
        }
        for (name, value) in &event.path_parameters {
            values.push((format!("pathParameters.{}", name), value));
        }
        if let Some(body) = &event.body {
            collect_strings("body".to_string(), body, &mut values);
        }

        values.into_iter().find_map(|(field, value)| {
            SQL_PATTERNS
                .iter()
                .find(|(_, regex)| regex.is_match(value))
                .map(|(attack, _)| (field, *attack))
        })
    }
}

impl SecurityScanner for Protection {
    fn validate(&self, event: &ApiEvent) -> Result<(), LifecycleError> {
        if self.options.mode == ProtectionMode::Disabled {
            return Ok(());
        }

        let Some((field, attack)) = self.scan(event) else {
            return Ok(());
        };

        match self.options.mode {
            ProtectionMode::Fail => Err(LifecycleError::detection(format!(
                "possible SQL injection ({}) in {}",
                attack, field
            ))),
            _ => {
                warn!("Possible SQL injection ({}) in {}", attack, field);
                Ok(())
            }
        }
    }
}

fn collect_strings<'a>(path: String, value: &'a Value, out: &mut Vec<(String, &'a str)>) {
    match value {
        Value::String(s) => out.push((path, s)),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_strings(format!("{}[{}]", path, i), item, out);
            }
        }
        Value::Object(fields) => {
            for (name, item) in fields {
                collect_strings(format!("{}.{}", path, name), item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::event::Method;
    use serde_json::json;

    fn event_with_query(value: &str) -> ApiEvent {
        let mut event = ApiEvent::new(Method::Get, "/");
        event
            .query_string_parameters
            .insert("name".to_string(), value.to_string());
        event
    }

    #[test]
    fn test_clean_event_passes() {
        let scanner = Protection::new(ProtectionOptions::new(ProtectionMode::Fail));
        assert!(scanner.validate(&event_with_query("O'Brien")).is_ok());
    }

    #[test]
    fn test_tautology_detected() {
        let scanner = Protection::new(ProtectionOptions::new(ProtectionMode::Fail));
        let err = scanner
            .validate(&event_with_query("x' OR '1'='1"))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Detection(_)));
        assert!(err.to_string().contains("queryStringParameters.name"));
    }

    #[test]
    fn test_body_scanned() {
        let scanner = Protection::new(ProtectionOptions::new(ProtectionMode::Fail));
        let mut event = ApiEvent::new(Method::Post, "/");
        event.body = Some(json!({"items": ["ok", "1; DROP TABLE items"]}));
        let err = scanner.validate(&event).unwrap_err();
        assert!(err.to_string().contains("body.items[1]"));
    }

    #[test]
    fn test_report_mode_allows() {
        let scanner = Protection::default();
        assert!(scanner
            .validate(&event_with_query("1 UNION SELECT password"))
            .is_ok());
    }

    #[test]
    fn test_disabled_mode_allows() {
        let scanner = Protection::new(ProtectionOptions::new(ProtectionMode::Disabled));
        assert!(scanner.validate(&event_with_query("admin'--")).is_ok());
    }
}
