//! # Gatehook - Event Handler Lifecycle
//!
//! Gatehook turns an inbound event (typically an HTTP request wrapped by an
//! API gateway) into a normalized invocation of business logic, with ordered
//! preprocessing, hook points, per-method validation and uniform response
//! shaping.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Engine<L: Lifecycle>                      │
//! │  preprocess ─▶ before ─▶ executor ─▶ shape result/error ─▶ finally │
//! └──────────────────────────────────────────────────────────────────┘
//!          │                                        │
//!          ▼                                        ▼
//! ┌──────────────────────┐              ┌───────────────────────────┐
//! │   GenericLifecycle   │              │       ApiLifecycle        │
//! │  (pass-through)      │              │  route table, collaborator│
//! │                      │              │  chain, response envelope │
//! └──────────────────────┘              └───────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gatehook::prelude::*;
//! use serde_json::{json, Value};
//!
//! async fn get_item(event: ApiEvent, _ctx: Context) -> Result<Value, LifecycleError> {
//!     Ok(json!({ "id": event.path_parameters.get("id") }))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), LifecycleError> {
//!     let handler = ApiHandler::builder()
//!         .header("Access-Control-Allow-Origin", "*")
//!         .get()
//!         .validation(Schema::new().path("id", FieldKind::Number))
//!         .handler(get_item)
//!         .build()?;
//!
//!     let event = json!({ "httpMethod": "GET", "pathParameters": { "id": "7" } });
//!     let response = handler.execute(&event, &mut Context::new("items", "req-1")).await?;
//!     println!("{}", response);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Containment
//!
//! Business, validation, detection and identity failures are shaped into an
//! error envelope. Configuration errors (no route for the method, no
//! executor) are returned as `Err`. Failures in the `finally` hook are logged
//! and never change the result.

pub mod api;
pub mod lifecycle;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::api::{
        ApiEvent, ApiHandler, ApiOptions, BearerToken, BodyEncoding, CorsOptions, FieldKind,
        Method, ProtectionMode, ProtectionOptions, Response, Schema,
    };
    pub use crate::lifecycle::{Context, Handler, LifecycleError};
    pub use async_trait::async_trait;
}

// Re-export for convenience
pub use api::{ApiEvent, ApiHandler, Response};
pub use lifecycle::{Context, Engine, Handler, LifecycleError};
