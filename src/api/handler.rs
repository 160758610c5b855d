//! Gateway specialization of the lifecycle engine.

use crate::api::body::{decode_body, BodyEncoding};
use crate::api::config::{ApiOptions, CorsOptions};
use crate::api::cookies::parse_cookies;
use crate::api::event::{ApiEvent, Method};
use crate::api::hooks::{OnErrorHook, OnResponse};
use crate::api::identity::{IdentityValidator, NoIdentity};
use crate::api::method::MethodHandler;
use crate::api::protection::{Protection, ProtectionOptions, SecurityScanner};
use crate::api::response::{self, header_text, Headers};
use crate::api::validation::Validator;
use crate::lifecycle::hooks::Hooks;
use crate::lifecycle::{
    BeforeHook, Context, Engine, Executor, FinallyHook, Lifecycle, LifecycleError, Prepared,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Route resolved during preprocessing.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Method the event was dispatched on.
    pub method: Method,
    /// The route record.
    pub handler: MethodHandler,
}

/// Lifecycle for gateway request events.
pub struct ApiLifecycle {
    routes: HashMap<Method, MethodHandler>,
    headers: Headers,
    body_encoding: BodyEncoding,
    scanner: Arc<dyn SecurityScanner>,
    identity: Arc<dyn IdentityValidator>,
    on_error: Option<Arc<dyn OnErrorHook>>,
}

impl ApiLifecycle {
    /// Methods with a registered route, sorted.
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.routes.keys().copied().collect();
        methods.sort();
        methods
    }

    /// Headers added to every response.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    fn resolve(&self, event: &Value) -> Result<RouteMatch, LifecycleError> {
        let name = event.get("httpMethod").and_then(Value::as_str);
        name.and_then(|name| name.parse::<Method>().ok())
            .and_then(|method| {
                self.routes.get(&method).map(|handler| RouteMatch {
                    method,
                    handler: handler.clone(),
                })
            })
            .ok_or_else(|| {
                LifecycleError::configuration(format!(
                    "handler not defined for http method: {}",
                    name.unwrap_or("<none>")
                ))
            })
    }
}

#[async_trait]
impl Lifecycle for ApiLifecycle {
    type Event = ApiEvent;
    type Extra = Option<RouteMatch>;

    fn preprocess(
        &self,
        event: Value,
        _context: &Context,
        extra: &mut Option<RouteMatch>,
    ) -> Result<Prepared<ApiEvent>, LifecycleError> {
        let route = self.resolve(&event)?;
        let executor = route.handler.executor.clone();
        let handler = route.handler.clone();
        *extra = Some(route);

        let mut event: ApiEvent = serde_json::from_value(event).map_err(|e| {
            LifecycleError::validation(format!("malformed event: {}", e), Vec::new())
        })?;
        event.clear_derived();

        if let Some(Value::String(raw)) = &event.body {
            if !raw.is_empty() {
                let raw = raw.clone();
                event.body = Some(decode_body(&raw, event.is_base64_encoded, self.body_encoding)?);
                event.raw_body = Some(raw);
            }
        }

        self.scanner.validate(&event)?;
        event.cookies = parse_cookies(&event.headers);
        self.identity.validate(&mut event)?;
        handler.validate(&event)?;

        Ok(Prepared { event, executor })
    }

    async fn process_result(
        &self,
        result: Value,
        context: &Context,
        extra: &Option<RouteMatch>,
    ) -> Result<Value, LifecycleError> {
        let Some(route) = extra else {
            return Ok(result);
        };

        let response = response::process_result(result, context, &self.headers)?;
        route.handler.respond(response.to_value()?).await
    }

    async fn process_error(
        &self,
        error: LifecycleError,
        context: &Context,
        extra: &Option<RouteMatch>,
    ) -> Result<Value, LifecycleError> {
        let Some(route) = extra else {
            return Err(error);
        };

        let error = match &self.on_error {
            Some(hook) => hook
                .on_error(error.clone(), &context.event, context)
                .await
                .unwrap_or(error),
            None => error,
        };

        debug!(
            "Shaping {} for {} [{}]",
            error.kind(),
            route.method,
            context.request_id
        );
        let response = response::process_error(&error, &self.headers);
        route.handler.respond(response.to_value()?).await
    }
}

/// A gateway request handler.
pub type ApiHandler = Engine<ApiLifecycle>;

impl Engine<ApiLifecycle> {
    /// Start configuring a gateway handler.
    pub fn builder() -> ApiHandlerBuilder {
        ApiHandlerBuilder::default()
    }

    /// Start configuring a gateway handler from options.
    pub fn with_options(options: ApiOptions) -> ApiHandlerBuilder {
        let mut builder = ApiHandlerBuilder::default()
            .body_encoding(options.body_encoding)
            .protection(options.protection);
        builder.headers = options.headers;
        builder.hooks.callback_waits_for_empty_event_loop =
            options.callback_waits_for_empty_event_loop;
        builder
    }
}

/// Fluent builder for [`ApiHandler`].
///
/// Declaring a route (`get`, `post`, ...) makes it current; `validation`,
/// `handler` and `on_response` apply to the current route.
pub struct ApiHandlerBuilder {
    routes: HashMap<Method, MethodHandler>,
    current: Option<Method>,
    misuse: Option<LifecycleError>,
    headers: Headers,
    body_encoding: BodyEncoding,
    scanner: Arc<dyn SecurityScanner>,
    identity: Arc<dyn IdentityValidator>,
    on_error: Option<Arc<dyn OnErrorHook>>,
    hooks: Hooks<ApiEvent>,
}

impl Default for ApiHandlerBuilder {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
            current: None,
            misuse: None,
            headers: Headers::new(),
            body_encoding: BodyEncoding::default(),
            scanner: Arc::new(Protection::default()),
            identity: Arc::new(NoIdentity),
            on_error: None,
            hooks: Hooks::default(),
        }
    }
}

impl ApiHandlerBuilder {
    /// Declare a route for `method` and make it current.
    ///
    /// Declaring the same method twice replaces the earlier route.
    pub fn route(mut self, method: Method) -> Self {
        self.routes.insert(method, MethodHandler::new());
        self.current = Some(method);
        self
    }

    /// Declare a `GET` route.
    pub fn get(self) -> Self {
        self.route(Method::Get)
    }

    /// Declare a `POST` route.
    pub fn post(self) -> Self {
        self.route(Method::Post)
    }

    /// Declare a `PUT` route.
    pub fn put(self) -> Self {
        self.route(Method::Put)
    }

    /// Declare a `PATCH` route.
    pub fn patch(self) -> Self {
        self.route(Method::Patch)
    }

    /// Declare a `DELETE` route.
    pub fn delete(self) -> Self {
        self.route(Method::Delete)
    }

    /// Declare a `HEAD` route.
    pub fn head(self) -> Self {
        self.route(Method::Head)
    }

    /// Declare an `OPTIONS` route.
    pub fn options(self) -> Self {
        self.route(Method::Options)
    }

    fn with_current(mut self, apply: impl FnOnce(&mut MethodHandler)) -> Self {
        match self.current.and_then(|method| self.routes.get_mut(&method)) {
            Some(handler) => apply(handler),
            None => {
                self.misuse
                    .get_or_insert_with(|| LifecycleError::configuration("method not selected"));
            }
        }
        self
    }

    /// Set the validator of the current route.
    pub fn validation(self, validator: impl Validator + 'static) -> Self {
        self.with_current(|handler| handler.set_validation(validator))
    }

    /// Set the executor of the current route.
    pub fn handler(self, executor: impl Executor<ApiEvent> + 'static) -> Self {
        self.with_current(|handler| handler.set_handler(executor))
    }

    /// Set the response hook of the current route.
    pub fn on_response(self, hook: impl OnResponse + 'static) -> Self {
        self.with_current(|handler| handler.set_on_response(hook))
    }

    /// Add a response header. Empty values are ignored.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Some(value) = header_text(&value.into()) {
            self.headers.insert(name.into(), value);
        }
        self
    }

    /// Add several response headers.
    pub fn headers<K, V>(self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .fold(self, |builder, (name, value)| builder.header(name, value))
    }

    /// Add cross-origin response headers.
    pub fn cors(self, options: CorsOptions) -> Self {
        self.headers(options.headers())
    }

    /// Set the body decoding mode.
    pub fn body_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.body_encoding = encoding;
        self
    }

    /// Force form-urlencoded decoding, or go back to automatic detection.
    pub fn form_url_encoded(self, enabled: bool) -> Self {
        self.body_encoding(if enabled {
            BodyEncoding::FormUrlEncoded
        } else {
            BodyEncoding::Auto
        })
    }

    /// Leave bodies undecoded.
    pub fn skip_body_parse(self) -> Self {
        self.body_encoding(BodyEncoding::None)
    }

    /// Configure the built-in injection scanner.
    pub fn protection(mut self, options: ProtectionOptions) -> Self {
        self.scanner = Arc::new(Protection::new(options));
        self
    }

    /// Replace the injection scanner.
    pub fn scanner(mut self, scanner: impl SecurityScanner + 'static) -> Self {
        self.scanner = Arc::new(scanner);
        self
    }

    /// Set the identity validator.
    pub fn identity(mut self, validator: impl IdentityValidator + 'static) -> Self {
        self.identity = Arc::new(validator);
        self
    }

    /// Set the hook consulted before errors are shaped.
    pub fn on_error(mut self, hook: impl OnErrorHook + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
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
        processor: impl Fn(ApiEvent) -> ApiEvent + Send + Sync + 'static,
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
    ///
    /// Fails if a route builder call was made before any route was declared,
    /// or if a declared route has no executor.
    pub fn build(self) -> Result<ApiHandler, LifecycleError> {
        if let Some(err) = self.misuse {
            return Err(err);
        }

        let mut methods: Vec<&Method> = self.routes.keys().collect();
        methods.sort();
        if let Some(method) = methods
            .iter()
            .find(|method| !self.routes[**method].has_executor())
        {
            return Err(LifecycleError::configuration(format!(
                "handler not defined for http method: {}",
                method
            )));
        }

        info!("Built API handler with routes: {:?}", methods);
        let lifecycle = ApiLifecycle {
            routes: self.routes,
            headers: self.headers,
            body_encoding: self.body_encoding,
            scanner: self.scanner,
            identity: self.identity,
            on_error: self.on_error,
        };
        Ok(Engine::new(lifecycle, self.hooks))
    }
}
