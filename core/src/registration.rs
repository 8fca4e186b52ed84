#![deny(missing_docs)]

//! # Controller Registration
//!
//! Explicit fluent registration of controllers and routes. Both compilers
//! describe controllers through these types, so route naming, path joining,
//! verb defaults and middleware ordering live in one place.
//!
//! ```
//! use routemeta_core::registration::{ControllerRegistration, ControllerRegistry, RouteRegistration};
//! use routemeta_core::model::{ApiRequest, MiddlewareRef};
//!
//! #[derive(Default)]
//! struct Simple;
//!
//! let mut registry = ControllerRegistry::new();
//! registry.register(
//!     ControllerRegistration::of::<Simple>("simple")
//!         .prefix("/simple")
//!         .middleware(vec![MiddlewareRef::key("one")])
//!         .route(
//!             RouteRegistration::new("get")
//!                 .path(":id")
//!                 .handle(|_: &mut Simple, req: &mut ApiRequest| {
//!                     req.send(200, serde_json::Value::Null);
//!                     Ok(())
//!                 }),
//!         ),
//! );
//! assert_eq!(registry.len(), 1);
//! ```

use crate::config::CompilerConfig;
use crate::model::{
    ApiRequest, ControllerDescriptor, ControllerFactory, HandlerResult, MiddlewareRef,
    RouteDescriptor, RouteHandler, Validator, Verb,
};
use crate::naming::{default_route, default_verbs, make_route, make_route_name};

/// Facts declared for one controller member.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistration {
    /// Member name.
    pub member: String,
    /// Explicit path segment.
    pub path: Option<String>,
    /// Explicit verbs.
    pub verbs: Option<Vec<Verb>>,
    /// Route-level middleware, in declaration order.
    pub middleware: Vec<MiddlewareRef>,
    /// Content type override.
    pub content_type: Option<String>,
    /// Handler.
    pub handler: Option<RouteHandler>,
    /// Body validator.
    pub validate_body: Option<Validator>,
    /// Path parameter validator.
    pub validate_params: Option<Validator>,
    /// Query string validator.
    pub validate_query: Option<Validator>,
}

impl RouteRegistration {
    /// Starts a registration for `member`.
    pub fn new(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            ..Default::default()
        }
    }

    /// Sets the path segment.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the accepted verbs.
    pub fn verbs(mut self, verbs: impl IntoIterator<Item = Verb>) -> Self {
        self.verbs = Some(verbs.into_iter().collect());
        self
    }

    /// Appends route-level middleware.
    pub fn middleware(mut self, refs: impl IntoIterator<Item = MiddlewareRef>) -> Self {
        self.middleware.extend(refs);
        self
    }

    /// Sets the content type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the handler.
    pub fn handler(mut self, handler: RouteHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Sets the handler from a method-like function on `C`.
    pub fn handle<C, F>(self, f: F) -> Self
    where
        C: 'static,
        F: Fn(&mut C, &mut ApiRequest) -> HandlerResult + Send + Sync + 'static,
    {
        self.handler(RouteHandler::new(f))
    }

    /// Sets the body validator.
    pub fn validate_body(mut self, validator: Validator) -> Self {
        self.validate_body = Some(validator);
        self
    }

    /// Sets the path parameter validator.
    pub fn validate_params(mut self, validator: Validator) -> Self {
        self.validate_params = Some(validator);
        self
    }

    /// Sets the query string validator.
    pub fn validate_query(mut self, validator: Validator) -> Self {
        self.validate_query = Some(validator);
        self
    }
}

/// Facts declared for one controller.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistration {
    /// Controller name.
    pub name: String,
    /// Route prefix.
    pub prefix: Option<String>,
    /// Controller-level middleware.
    pub middleware: Vec<MiddlewareRef>,
    /// Routes in declaration order.
    pub routes: Vec<RouteRegistration>,
    /// Instance factory.
    pub factory: Option<ControllerFactory>,
}

impl ControllerRegistration {
    /// Starts a registration for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Starts a registration whose instances are `C::default()`.
    pub fn of<C: Default + Send + 'static>(name: impl Into<String>) -> Self {
        Self::new(name).factory(ControllerFactory::of::<C>())
    }

    /// Sets the route prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Appends controller-level middleware.
    pub fn middleware(mut self, refs: impl IntoIterator<Item = MiddlewareRef>) -> Self {
        self.middleware.extend(refs);
        self
    }

    /// Adds a route.
    pub fn route(mut self, route: RouteRegistration) -> Self {
        self.routes.push(route);
        self
    }

    /// Sets the instance factory.
    pub fn factory(mut self, factory: ControllerFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Describes one of this controller's routes, applying controller defaults.
    pub fn describe_route(&self, route: &RouteRegistration, config: &CompilerConfig) -> RouteDescriptor {
        let verbs = match &route.verbs {
            Some(verbs) if !verbs.is_empty() => verbs.clone(),
            _ => default_verbs(&route.member),
        };
        let mut middleware = self.middleware.clone();
        middleware.extend(route.middleware.iter().cloned());

        RouteDescriptor {
            name: make_route_name(&self.name, &route.member),
            member_name: route.member.clone(),
            path: make_route(
                self.prefix.as_deref(),
                Some(route.path.as_deref().unwrap_or(default_route())),
            ),
            verbs,
            content_type: route
                .content_type
                .clone()
                .unwrap_or_else(|| config.default_content_type.clone()),
            middleware,
            handler: route.handler.clone(),
            validate_body: route.validate_body.clone(),
            validate_params: route.validate_params.clone(),
            validate_query: route.validate_query.clone(),
            request_types: None,
        }
    }

    /// Describes the controller with the given routes.
    pub fn describe(&self, routes: Vec<RouteDescriptor>) -> ControllerDescriptor {
        ControllerDescriptor {
            name: self.name.clone(),
            route_prefix: self.prefix.clone(),
            middleware: self.middleware.clone(),
            routes,
            factory: self.factory.clone(),
        }
    }
}

/// Process-scoped list of controller registrations.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: Vec<ControllerRegistration>,
}

impl ControllerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a controller.
    pub fn register(&mut self, controller: ControllerRegistration) -> &mut Self {
        self.controllers.push(controller);
        self
    }

    /// All registrations in order.
    pub fn get_all(&self) -> &[ControllerRegistration] {
        &self.controllers
    }

    /// Finds a registration by controller name.
    pub fn find(&self, name: &str) -> Option<&ControllerRegistration> {
        self.controllers.iter().find(|c| c.name == name)
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
