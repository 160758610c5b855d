//! Hooks specific to the gateway lifecycle.

use crate::lifecycle::{Context, LifecycleError};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;

/// Transforms a shaped response, on both the success and the error path.
#[async_trait]
pub trait OnResponse: Send + Sync {
    async fn on_response(&self, response: Value) -> Result<Value, LifecycleError>;
}

#[async_trait]
impl<F, Fut> OnResponse for F
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, LifecycleError>> + Send,
{
    async fn on_response(&self, response: Value) -> Result<Value, LifecycleError> {
        (self)(response).await
    }
}

/// Inspects an error before it is shaped; a returned error replaces it.
#[async_trait]
pub trait OnErrorHook: Send + Sync {
    async fn on_error(
        &self,
        error: LifecycleError,
        event: &Value,
        context: &Context,
    ) -> Option<LifecycleError>;
}

#[async_trait]
impl<F, Fut> OnErrorHook for F
where
    F: Fn(LifecycleError, Value, Context) -> Fut + Send + Sync,
    Fut: Future<Output = Option<LifecycleError>> + Send,
{
    async fn on_error(
        &self,
        error: LifecycleError,
        event: &Value,
        context: &Context,
    ) -> Option<LifecycleError> {
        (self)(error, event.clone(), context.clone()).await
    }
}
