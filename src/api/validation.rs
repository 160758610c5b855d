//! Per-route event validation.

use crate::api::event::ApiEvent;
use crate::lifecycle::LifecycleError;
use serde_json::Value;
use std::collections::HashMap;

/// Validates a fully preprocessed event.
pub trait Validator: Send + Sync {
    fn validate(&self, event: &ApiEvent) -> Result<(), LifecycleError>;
}

impl<F> Validator for F
where
    F: Fn(&ApiEvent) -> Result<(), LifecycleError> + Send + Sync,
{
    fn validate(&self, event: &ApiEvent) -> Result<(), LifecycleError> {
        (self)(event)
    }
}

/// Part of the event a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Body,
    Query,
    Path,
    Headers,
}

impl Section {
    fn prefix(&self) -> &'static str {
        match self {
            Section::Body => "body",
            Section::Query => "queryStringParameters",
            Section::Path => "pathParameters",
            Section::Headers => "headers",
        }
    }
}

/// Expected shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Any,
}

impl FieldKind {
    fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Object => "an object",
            FieldKind::Array => "an array",
            FieldKind::Any => "present",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
            FieldKind::Any => !value.is_null(),
        }
    }

    /// Query, path and header values always arrive as strings.
    fn accepts_text(&self, text: &str) -> bool {
        match self {
            FieldKind::Number => text.parse::<f64>().is_ok(),
            FieldKind::Boolean => matches!(text, "true" | "false"),
            FieldKind::Object | FieldKind::Array => false,
            FieldKind::String | FieldKind::Any => true,
        }
    }
}

#[derive(Debug, Clone)]
struct FieldRule {
    section: Section,
    name: String,
    kind: FieldKind,
    required: bool,
}

/// Declarative field rules checked against an event.
///
/// Every violated rule is reported, not only the first.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    rules: Vec<FieldRule>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule.
    pub fn field(
        mut self,
        section: Section,
        name: impl Into<String>,
        kind: FieldKind,
        required: bool,
    ) -> Self {
        self.rules.push(FieldRule {
            section,
            name: name.into(),
            kind,
            required,
        });
        self
    }

    /// Require a body field.
    pub fn body(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(Section::Body, name, kind, true)
    }

    /// Allow an optional body field, checking its kind when present.
    pub fn optional_body(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(Section::Body, name, kind, false)
    }

    /// Require a query parameter.
    pub fn query(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(Section::Query, name, kind, true)
    }

    /// Require a path parameter.
    pub fn path(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(Section::Path, name, kind, true)
    }

    /// Require a header.
    pub fn header(self, name: impl Into<String>) -> Self {
        self.field(Section::Headers, name, FieldKind::String, true)
    }

    fn check(&self, rule: &FieldRule, event: &ApiEvent) -> Option<String> {
        let path = format!("{}.{}", rule.section.prefix(), rule.name);
        let accepted = match rule.section {
            Section::Body => match event.body.as_ref().and_then(|b| b.get(&rule.name)) {
                None | Some(Value::Null) => None,
                Some(value) => Some(rule.kind.accepts(value)),
            },
            Section::Query => text_field(&event.query_string_parameters, &rule.name)
                .map(|text| rule.kind.accepts_text(text)),
            Section::Path => text_field(&event.path_parameters, &rule.name)
                .map(|text| rule.kind.accepts_text(text)),
            Section::Headers => event
                .get_header(&rule.name)
                .map(|text| rule.kind.accepts_text(text)),
        };

        match accepted {
            None if rule.required => Some(format!("{} is required", path)),
            Some(false) => Some(format!("{} must be {}", path, rule.kind.name())),
            _ => None,
        }
    }
}

fn text_field<'a>(fields: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    fields.get(name).map(String::as_str)
}

impl Validator for Schema {
    fn validate(&self, event: &ApiEvent) -> Result<(), LifecycleError> {
        let mut fields = Vec::new();
        let mut problems = Vec::new();
        for rule in &self.rules {
            if let Some(problem) = self.check(rule, event) {
                fields.push(format!("{}.{}", rule.section.prefix(), rule.name));
                problems.push(problem);
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::validation(problems.join("; "), fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::event::Method;
    use serde_json::json;

    fn event(body: Value) -> ApiEvent {
        let mut event = ApiEvent::new(Method::Put, "/items/1");
        event.body = Some(body);
        event
    }

    #[test]
    fn test_all_offending_fields_reported() {
        let schema = Schema::new()
            .body("id", FieldKind::Number)
            .body("name", FieldKind::String)
            .optional_body("points", FieldKind::Number);

        let err = schema
            .validate(&event(json!({"name": 3, "points": "many"})))
            .unwrap_err();

        assert_eq!(
            err.fields(),
            ["body.id", "body.name", "body.points"].map(String::from)
        );
        assert_eq!(
            err.to_string(),
            "body.id is required; body.name must be a string; body.points must be a number"
        );
    }

    #[test]
    fn test_optional_may_be_absent() {
        let schema = Schema::new().optional_body("points", FieldKind::Number);
        assert!(schema.validate(&event(json!({}))).is_ok());
    }

    #[test]
    fn test_text_sections() {
        let schema = Schema::new()
            .path("id", FieldKind::Number)
            .query("verbose", FieldKind::Boolean)
            .header("X-Api-Key");

        let mut ok = ApiEvent::new(Method::Get, "/").header("x-api-key", "k");
        ok.path_parameters.insert("id".into(), "42".into());
        ok.query_string_parameters
            .insert("verbose".into(), "true".into());
        assert!(schema.validate(&ok).is_ok());

        let mut bad = ok.clone();
        bad.path_parameters.insert("id".into(), "abc".into());
        let err = schema.validate(&bad).unwrap_err();
        assert_eq!(err.fields(), ["pathParameters.id".to_string()]);
    }

    #[test]
    fn test_closure_validator() {
        let validator = |event: &ApiEvent| {
            if event.path.as_deref() == Some("/") {
                Ok(())
            } else {
                Err(LifecycleError::validation("bad path", vec!["path".into()]))
            }
        };
        assert!(validator.validate(&ApiEvent::new(Method::Get, "/")).is_ok());
        assert!(validator.validate(&ApiEvent::new(Method::Get, "/x")).is_err());
    }
}
