//! Capability traits for executors and lifecycle hooks.
//!
//! Each trait is implemented for plain closures returning futures, so both
//! `async fn` items and structs carrying their own state can be plugged in.

use crate::lifecycle::context::Context;
use crate::lifecycle::error::LifecycleError;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Business logic invoked once per event.
#[async_trait]
pub trait Executor<E: Send + 'static>: Send + Sync {
    /// Handle the preprocessed event.
    async fn invoke(&self, event: E, context: &Context) -> Result<Value, LifecycleError>;
}

#[async_trait]
impl<E, F, Fut> Executor<E> for F
where
    E: Send + 'static,
    F: Fn(E, Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, LifecycleError>> + Send,
{
    async fn invoke(&self, event: E, context: &Context) -> Result<Value, LifecycleError> {
        (self)(event, context.clone()).await
    }
}

/// Hook run after preprocessing and before the executor.
///
/// A resolved value is attached to the context as `additional`.
#[async_trait]
pub trait BeforeHook: Send + Sync {
    async fn before(&self, context: &Context) -> Result<Option<Value>, LifecycleError>;
}

#[async_trait]
impl<F, Fut> BeforeHook for F
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Value>, LifecycleError>> + Send,
{
    async fn before(&self, context: &Context) -> Result<Option<Value>, LifecycleError> {
        (self)(context.clone()).await
    }
}

/// Hook run once the result has been shaped, whatever the outcome.
///
/// Failures are logged and never reach the caller.
#[async_trait]
pub trait FinallyHook: Send + Sync {
    async fn run(&self, context: &Context) -> Result<(), LifecycleError>;
}

#[async_trait]
impl<F, Fut> FinallyHook for F
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), LifecycleError>> + Send,
{
    async fn run(&self, context: &Context) -> Result<(), LifecycleError> {
        (self)(context.clone()).await
    }
}

/// Synchronous transform applied to the event right before the executor.
pub type EventProcessor<E> = Arc<dyn Fn(E) -> E + Send + Sync>;

/// Hooks shared by every lifecycle specialization.
pub(crate) struct Hooks<E> {
    pub(crate) before: Option<Arc<dyn BeforeHook>>,
    pub(crate) finally: Option<Arc<dyn FinallyHook>>,
    pub(crate) event_processor: Option<EventProcessor<E>>,
    pub(crate) callback_waits_for_empty_event_loop: Option<bool>,
}

impl<E> Default for Hooks<E> {
    fn default() -> Self {
        Self {
            before: None,
            finally: None,
            event_processor: None,
            callback_waits_for_empty_event_loop: None,
        }
    }
}
