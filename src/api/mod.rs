//! API-gateway specialization: per-method routing, request preprocessing
//! and response envelopes.
//!
//! Preprocessing runs these steps in order, stopping at the first failure:
//!
//! 1. resolve the route from `httpMethod`
//! 2. normalize absent collections to empty maps
//! 3. decode the body (the original is kept as `rawBody`)
//! 4. scan for injection attempts
//! 5. parse cookies
//! 6. validate identity
//! 7. validate the route schema

pub mod body;
pub mod config;
pub mod cookies;
pub mod event;
pub mod handler;
pub mod hooks;
pub mod identity;
pub mod method;
pub mod protection;
pub mod response;
pub mod validation;

pub use body::BodyEncoding;
pub use config::{ApiOptions, CorsOptions};
pub use event::{ApiEvent, Method};
pub use handler::{ApiHandler, ApiHandlerBuilder, ApiLifecycle, RouteMatch};
pub use hooks::{OnErrorHook, OnResponse};
pub use identity::{BearerToken, IdentityValidator, NoIdentity};
pub use method::MethodHandler;
pub use protection::{Protection, ProtectionMode, ProtectionOptions, SecurityScanner};
pub use response::{Headers, Response};
pub use validation::{FieldKind, Schema, Section, Validator};
