//! Execution context handed to hooks and executors.

use serde_json::Value;
use std::collections::HashMap;

/// Execution context for a single invocation.
#[derive(Debug, Clone)]
pub struct Context {
    /// Request ID for tracing.
    pub request_id: String,
    /// Function name.
    pub function_name: String,
    /// Environment variables available to the handler.
    pub env: HashMap<String, String>,
    /// The inbound event as received, before any preprocessing.
    pub event: Value,
    /// Value resolved by the `before` hook, if any.
    pub additional: Option<Value>,
    /// Whether the host should wait for background work to drain before
    /// treating the invocation as complete.
    pub callback_waits_for_empty_event_loop: bool,
}

impl Context {
    /// Create a new context.
    pub fn new(function_name: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            function_name: function_name.into(),
            env: HashMap::new(),
            event: Value::Null,
            additional: None,
            callback_waits_for_empty_event_loop: true,
        }
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Get an environment variable.
    pub fn get_env(&self, key: &str) -> Option<&String> {
        self.env.get(key)
    }

    /// Copy of this context bound to `event`, used for the duration of one
    /// invocation so hooks cannot alter the caller's context.
    pub(crate) fn safe_copy(&self, event: &Value) -> Self {
        let mut safe = self.clone();
        safe.event = event.clone();
        safe
    }

    /// Carry the wait-for-empty-loop opt-out back onto the caller's context.
    pub(crate) fn update_from(&mut self, safe: &Context) {
        if !safe.callback_waits_for_empty_event_loop {
            self.callback_waits_for_empty_event_loop = false;
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new("", "")
    }
}
