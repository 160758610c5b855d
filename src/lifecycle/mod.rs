//! Generic event-handler lifecycle.

pub mod context;
pub mod engine;
pub mod error;
pub mod generic;
pub mod hooks;

pub use context::Context;
pub use engine::{Engine, Lifecycle, Prepared};
pub use error::LifecycleError;
pub use generic::{GenericLifecycle, Handler, HandlerBuilder};
pub use hooks::{BeforeHook, EventProcessor, Executor, FinallyHook};
