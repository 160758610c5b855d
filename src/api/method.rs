//! Per-method route record.

use crate::api::event::ApiEvent;
use crate::api::hooks::OnResponse;
use crate::api::validation::Validator;
use crate::lifecycle::{Executor, LifecycleError};
use serde_json::Value;
use std::sync::Arc;

/// Validator, executor and response hook registered for one method.
///
/// Populated while the handler is being built and read-only afterwards.
/// Every setter overwrites the previous value.
#[derive(Clone, Default)]
pub struct MethodHandler {
    pub(crate) validator: Option<Arc<dyn Validator>>,
    pub(crate) executor: Option<Arc<dyn Executor<ApiEvent>>>,
    pub(crate) on_response: Option<Arc<dyn OnResponse>>,
}

impl MethodHandler {
    /// Create an empty route record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validator.
    pub fn set_validation(&mut self, validator: impl Validator + 'static) {
        self.validator = Some(Arc::new(validator));
    }

    /// Set the executor.
    pub fn set_handler(&mut self, executor: impl Executor<ApiEvent> + 'static) {
        self.executor = Some(Arc::new(executor));
    }

    /// Set the response hook.
    pub fn set_on_response(&mut self, hook: impl OnResponse + 'static) {
        self.on_response = Some(Arc::new(hook));
    }

    /// Whether an executor has been set.
    pub fn has_executor(&self) -> bool {
        self.executor.is_some()
    }

    pub(crate) fn validate(&self, event: &ApiEvent) -> Result<(), LifecycleError> {
        match &self.validator {
            Some(validator) => validator.validate(event),
            None => Ok(()),
        }
    }

    pub(crate) async fn respond(&self, response: Value) -> Result<Value, LifecycleError> {
        match &self.on_response {
            Some(hook) => hook.on_response(response).await,
            None => Ok(response),
        }
    }
}

impl std::fmt::Debug for MethodHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodHandler")
            .field("validator", &self.validator.is_some())
            .field("executor", &self.executor.is_some())
            .field("on_response", &self.on_response.is_some())
            .finish()
    }
}
