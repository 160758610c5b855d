//! Route-agnostic handler: the event is passed to the executor untouched.

use crate::lifecycle::context::Context;
use crate::lifecycle::engine::{Engine, Lifecycle, Prepared};
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::hooks::{BeforeHook, Executor, FinallyHook, Hooks};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Lifecycle with no preprocessing and pass-through shaping.
pub struct GenericLifecycle {
    executor: Option<Arc<dyn Executor<Value>>>,
}

#[async_trait]
impl Lifecycle for GenericLifecycle {
    type Event = Value;
    type Extra = ();

    fn preprocess(
        &self,
        event: Value,
        _context: &Context,
        _extra: &mut (),
    ) -> Result<Prepared<Value>, LifecycleError> {
        Ok(Prepared {
            event,
            executor: self.executor.clone(),
        })
    }

    async fn process_result(
        &self,
        result: Value,
        _context: &Context,
        _extra: &(),
    ) -> Result<Value, LifecycleError> {
        Ok(result)
    }

    async fn process_error(
        &self,
        error: LifecycleError,
        _context: &Context,
        _extra: &(),
    ) -> Result<Value, LifecycleError> {
        Err(error)
    }
}

/// A generic event handler.
pub type Handler = Engine<GenericLifecycle>;

impl Engine<GenericLifecycle> {
    /// Start configuring a generic handler.
    pub fn builder() -> HandlerBuilder {
        HandlerBuilder::default()
    }
}

/// Fluent builder for [`Handler`].
#[derive(Default)]
pub struct HandlerBuilder {
    executor: Option<Arc<dyn Executor<Value>>>,
    hooks: Hooks<Value>,
}

impl HandlerBuilder {
    /// Set the business logic.
    pub fn handler(mut self, executor: impl Executor<Value> + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Set the hook run before the executor.
    pub fn before(mut self, hook: impl BeforeHook + 'static) -> Self {
        self.hooks.before = Some(Arc::new(hook));
        self
    }

    /// Set the hook run after every invocation that reached `before`.
    pub fn finally(mut self, hook: impl FinallyHook + 'static) -> Self {
        self.hooks.finally = Some(Arc::new(hook));
        self
    }

    /// Transform the event right before the executor sees it.
    pub fn event_processor(
        mut self,
        processor: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.hooks.event_processor = Some(Arc::new(processor));
        self
    }

    /// Tell the host whether to wait for background work before completing.
    pub fn callback_waits_for_empty_event_loop(mut self, enabled: bool) -> Self {
        self.hooks.callback_waits_for_empty_event_loop = Some(enabled);
        self
    }

    /// Finish configuration.
    pub fn build(self) -> Result<Handler, LifecycleError> {
        if self.executor.is_none() {
            return Err(LifecycleError::configuration("handler not defined"));
        }

        info!("Built generic handler");
        Ok(Engine::new(
            GenericLifecycle {
                executor: self.executor,
            },
            self.hooks,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn echo(event: Value, _ctx: Context) -> Result<Value, LifecycleError> {
        Ok(event)
    }

    async fn fail(_event: Value, _ctx: Context) -> Result<Value, LifecycleError> {
        Err(LifecycleError::bad_request("nope"))
    }

    #[test]
    fn test_build_without_executor() {
        let err = Handler::builder().build().err().unwrap();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "handler not defined");
    }

    #[tokio::test]
    async fn test_result_passes_through() {
        let handler = Handler::builder().handler(echo).build().unwrap();
        let mut ctx = Context::default();
        let result = handler.execute(&json!({"a": 1}), &mut ctx).await.unwrap();
        assert_eq!(result, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_error_propagates() {
        let handler = Handler::builder().handler(fail).build().unwrap();
        let err = handler
            .execute(&json!({}), &mut Context::default())
            .await
            .unwrap_err();
        assert_eq!(err, LifecycleError::bad_request("nope"));
    }

    #[tokio::test]
    async fn test_event_is_deep_copied() {
        let handler = Handler::builder()
            .handler(echo)
            .event_processor(|mut event| {
                event["touched"] = json!(true);
                event
            })
            .build()
            .unwrap();

        let original = json!({"a": 1});
        let result = handler
            .execute(&original, &mut Context::default())
            .await
            .unwrap();
        assert_eq!(result, json!({"a": 1, "touched": true}));
        assert_eq!(original, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_before_value_becomes_additional() {
        let handler = Handler::builder()
            .before(|_ctx: Context| async { Ok::<_, LifecycleError>(Some(json!("extra"))) })
            .handler(|_event: Value, ctx: Context| async move {
                Ok::<_, LifecycleError>(ctx.additional.unwrap_or(Value::Null))
            })
            .build()
            .unwrap();

        let result = handler
            .execute(&json!({}), &mut Context::default())
            .await
            .unwrap();
        assert_eq!(result, json!("extra"));
    }

    #[tokio::test]
    async fn test_wait_flag_written_back() {
        let handler = Handler::builder()
            .handler(echo)
            .callback_waits_for_empty_event_loop(false)
            .build()
            .unwrap();

        let mut ctx = Context::new("fn", "req-1");
        handler.execute(&json!({}), &mut ctx).await.unwrap();
        assert!(!ctx.callback_waits_for_empty_event_loop);
    }

    #[tokio::test]
    async fn test_finally_runs_after_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handler = Handler::builder()
            .handler(fail)
            .finally(move |_ctx: Context| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, LifecycleError>(())
                }
            })
            .build()
            .unwrap();

        assert!(handler
            .execute(&json!({}), &mut Context::default())
            .await
            .is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
