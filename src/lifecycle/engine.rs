//! The invocation state machine shared by all handler flavours.
//!
//! ```text
//! event ─▶ preprocess ─▶ before ─▶ executor ─▶ shape result ─▶ finally
//!              │            │          │             │
//!              └────────────┴──────────┴─────────────┴─▶ shape error
//! ```
//!
//! `finally` runs only once the `before` stage has been entered.

use crate::lifecycle::context::Context;
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::hooks::{Executor, Hooks};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error};

/// Output of the preprocessing stage.
pub struct Prepared<E: Send + 'static> {
    /// Event handed to the executor.
    pub event: E,
    /// Executor resolved for this invocation.
    pub executor: Option<Arc<dyn Executor<E>>>,
}

/// Specialization points of the engine.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Event type seen by executors.
    type Event: Send + Sync + 'static;
    /// Per-invocation data passed from preprocessing to shaping.
    type Extra: Default + Send + Sync;

    /// Turn the deep-copied inbound event into an executable one.
    fn preprocess(
        &self,
        event: Value,
        context: &Context,
        extra: &mut Self::Extra,
    ) -> Result<Prepared<Self::Event>, LifecycleError>;

    /// Shape a successful result.
    async fn process_result(
        &self,
        result: Value,
        context: &Context,
        extra: &Self::Extra,
    ) -> Result<Value, LifecycleError>;

    /// Shape a failure. Returning `Err` propagates it to the caller.
    async fn process_error(
        &self,
        error: LifecycleError,
        context: &Context,
        extra: &Self::Extra,
    ) -> Result<Value, LifecycleError>;
}

/// Drives invocations through the lifecycle of `L`.
///
/// The engine is read-only once built and can be shared across concurrent
/// invocations behind an `Arc`.
pub struct Engine<L: Lifecycle> {
    lifecycle: L,
    hooks: Hooks<L::Event>,
}

impl<L: Lifecycle> Engine<L> {
    pub(crate) fn new(lifecycle: L, hooks: Hooks<L::Event>) -> Self {
        Self { lifecycle, hooks }
    }

    /// The specialization this engine drives.
    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    /// Run one invocation.
    ///
    /// The event is deep-copied and the context is replaced by a private
    /// copy; only the wait-for-empty-loop opt-out is written back to
    /// `context`. `Ok` carries the shaped result, `Err` an error the
    /// specialization chose not to shape.
    pub async fn execute(
        &self,
        event: &Value,
        context: &mut Context,
    ) -> Result<Value, LifecycleError> {
        let mut safe = context.safe_copy(event);
        let outcome = self.invoke(event.clone(), &mut safe).await;
        context.update_from(&safe);
        outcome
    }

    async fn invoke(&self, event: Value, context: &mut Context) -> Result<Value, LifecycleError> {
        let mut extra = L::Extra::default();

        if self.hooks.callback_waits_for_empty_event_loop == Some(false) {
            context.callback_waits_for_empty_event_loop = false;
        }

        let prepared = match self.prepare(event, context, &mut extra) {
            Ok(prepared) => prepared,
            Err(err) => {
                debug!("Preprocessing failed [{}]: {}", context.request_id, err);
                return self.shape(Err(err), context, &extra).await;
            }
        };

        let outcome = self.run(prepared, context).await;
        let shaped = self.shape(outcome, context, &extra).await;

        if let Some(hook) = &self.hooks.finally {
            best_effort("finally", &context.request_id, hook.run(context)).await;
        }

        shaped
    }

    fn prepare(
        &self,
        event: Value,
        context: &Context,
        extra: &mut L::Extra,
    ) -> Result<(L::Event, Arc<dyn Executor<L::Event>>), LifecycleError> {
        let prepared = self.lifecycle.preprocess(event, context, extra)?;
        let executor = prepared
            .executor
            .ok_or_else(|| LifecycleError::configuration("handler not defined"))?;
        Ok((prepared.event, executor))
    }

    async fn run(
        &self,
        (event, executor): (L::Event, Arc<dyn Executor<L::Event>>),
        context: &mut Context,
    ) -> Result<Value, LifecycleError> {
        if let Some(hook) = &self.hooks.before {
            if let Some(additional) = hook.before(context).await?.filter(|v| !v.is_null()) {
                context.additional = Some(additional);
            }
        }

        let event = match &self.hooks.event_processor {
            Some(processor) => processor(event),
            None => event,
        };

        debug!("Invoking executor [{}]", context.request_id);
        executor.invoke(event, context).await
    }

    async fn shape(
        &self,
        outcome: Result<Value, LifecycleError>,
        context: &Context,
        extra: &L::Extra,
    ) -> Result<Value, LifecycleError> {
        match outcome {
            Ok(result) => match self.lifecycle.process_result(result, context, extra).await {
                Ok(shaped) => Ok(shaped),
                Err(err) => {
                    debug!("Result shaping failed [{}]: {}", context.request_id, err);
                    self.lifecycle.process_error(err, context, extra).await
                }
            },
            Err(err) => self.lifecycle.process_error(err, context, extra).await,
        }
    }
}

/// Await `work`, logging a failure instead of returning it.
pub(crate) async fn best_effort<F>(stage: &str, request_id: &str, work: F)
where
    F: Future<Output = Result<(), LifecycleError>>,
{
    if let Err(err) = work.await {
        error!("Uncaught error during {} [{}]: {}", stage, request_id, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_best_effort_swallows_error() {
        best_effort("finally", "req-1", async { Err::<(), _>(LifecycleError::new("boom")) }).await;
        best_effort("finally", "req-1", async { Ok::<(), LifecycleError>(()) }).await;
    }
}
