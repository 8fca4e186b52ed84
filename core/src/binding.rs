#![deny(missing_docs)]

//! # Route Binding
//!
//! Turns a valid [`Api`] into per-route request chains and hands them to a
//! host framework through the [`RouteBinder`] trait.
//!
//! Each chain runs the route's resolved middleware in order, then the body,
//! params and query validators, then the handler on a fresh controller
//! instance. A middleware returning [`Flow::Halt`] ends the chain. Errors from
//! any step are returned to the binder, which forwards them to the host.

use crate::error::{AppError, AppResult};
use crate::explorer::all_middleware_refs;
use crate::middleware::{resolve, Flow, MiddlewareHandler, MiddlewareRegistry};
use crate::model::{
    Api, ApiRequest, ControllerFactory, HandlerResult, RouteHandler, Validator, Verb,
};
use indexmap::IndexMap;
use std::any::Any;
use tracing::{debug, trace, warn};

/// Host framework adapter.
pub trait RouteBinder {
    /// Registers `chain` for one (verb, path) pair.
    fn bind(&mut self, verb: Verb, path: &str, chain: RequestChain);
}

/// The steps executed for one route.
#[derive(Debug, Clone)]
pub struct RequestChain {
    name: String,
    middleware: Vec<MiddlewareHandler>,
    validate_body: Option<Validator>,
    validate_params: Option<Validator>,
    validate_query: Option<Validator>,
    handler: RouteHandler,
    factory: ControllerFactory,
}

impl RequestChain {
    /// Route name the chain was built for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of middleware steps.
    pub fn middleware_len(&self) -> usize {
        self.middleware.len()
    }

    /// Runs the chain against `req`.
    pub fn dispatch(&self, req: &mut ApiRequest) -> HandlerResult {
        for step in &self.middleware {
            if step.call(req)? == Flow::Halt {
                trace!("{}: middleware halted the chain", self.name);
                return Ok(());
            }
        }
        if let Some(validator) = &self.validate_body {
            req.body = validator.validate(std::mem::take(&mut req.body))?;
        }
        if let Some(validator) = &self.validate_params {
            req.params = validator.validate(std::mem::take(&mut req.params))?;
        }
        if let Some(validator) = &self.validate_query {
            req.query = validator.validate(std::mem::take(&mut req.query))?;
        }
        let mut instance = self.factory.create();
        let instance: &mut dyn Any = instance.as_mut();
        self.handler.call(instance, req)
    }
}

/// Binds every route of an Api.
#[derive(Debug, Clone, Copy)]
pub struct RouteBuilder<'r> {
    registry: &'r MiddlewareRegistry,
}

impl<'r> RouteBuilder<'r> {
    /// Creates a builder resolving middleware against `registry`.
    pub fn new(registry: &'r MiddlewareRegistry) -> Self {
        Self { registry }
    }

    /// Binds `api` to `binder`, returning the number of (verb, path) pairs bound.
    ///
    /// An Api carrying errors is refused before anything is bound. Routes
    /// without a handler, and controllers without a factory, are skipped.
    pub fn build<B: RouteBinder + ?Sized>(&self, api: &Api, binder: &mut B) -> AppResult<usize> {
        if !api.is_valid() {
            return Err(AppError::Bind(format!(
                "refusing to bind an Api with {} errors: {}",
                api.errors.len(),
                api.error_messages().join("; ")
            )));
        }
        let resolved = resolve(all_middleware_refs(&api.controllers), self.registry).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            AppError::Bind(messages.join("; "))
        })?;

        let mut bound = 0;
        for controller in &api.controllers {
            let Some(factory) = &controller.factory else {
                warn!("Controller '{}' has no factory; its routes are not bound", controller.name);
                continue;
            };
            for route in &controller.routes {
                let Some(handler) = &route.handler else {
                    warn!("Route '{}' has no handler; not bound", route.name);
                    continue;
                };
                let chain = RequestChain {
                    name: route.name.clone(),
                    middleware: resolved.chain(&route.middleware),
                    validate_body: route.validate_body.clone(),
                    validate_params: route.validate_params.clone(),
                    validate_query: route.validate_query.clone(),
                    handler: handler.clone(),
                    factory: factory.clone(),
                };
                for verb in &route.verbs {
                    debug!("Binding {} {} -> {}", verb, route.path, route.name);
                    binder.bind(*verb, &route.path, chain.clone());
                    bound += 1;
                }
            }
        }
        Ok(bound)
    }
}

/// In-memory binder keyed by exact (verb, path).
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: IndexMap<(Verb, String), RequestChain>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain bound to (verb, path).
    pub fn get(&self, verb: Verb, path: &str) -> Option<&RequestChain> {
        self.routes.get(&(verb, path.to_string()))
    }

    /// Dispatches to the chain bound to (verb, path).
    pub fn dispatch(&self, verb: Verb, path: &str, req: &mut ApiRequest) -> HandlerResult {
        match self.get(verb, path) {
            Some(chain) => chain.dispatch(req),
            None => Err(format!("no route bound for {} {}", verb, path).into()),
        }
    }

    /// Bound pairs in binding order.
    pub fn keys(&self) -> impl Iterator<Item = (Verb, &str)> {
        self.routes.keys().map(|(verb, path)| (*verb, path.as_str()))
    }

    /// Number of bound pairs.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteBinder for RouteTable {
    fn bind(&mut self, verb: Verb, path: &str, chain: RequestChain) {
        self.routes.insert((verb, path.to_string()), chain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{MetadataCompiler, RuntimeCompiler};
    use crate::model::{HandlerError, MiddlewareRef};
    use crate::registration::{ControllerRegistration, ControllerRegistry, RouteRegistration};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[derive(Default)]
    struct Items {
        calls: usize,
    }

    impl Items {
        fn get(&mut self, req: &mut ApiRequest) -> HandlerResult {
            self.calls += 1;
            req.send(200, json!({ "id": req.params["id"], "calls": self.calls }));
            Ok(())
        }

        fn fail(&mut self, _: &mut ApiRequest) -> HandlerResult {
            Err("boom".into())
        }
    }

    fn require_id(value: Value) -> Result<Value, HandlerError> {
        match value.get("id") {
            Some(_) => Ok(value),
            None => Err("id is required".into()),
        }
    }

    fn registry() -> MiddlewareRegistry {
        let mut registry = MiddlewareRegistry::new();
        registry.register_function(
            "deny",
            MiddlewareHandler::new(|req| {
                req.send(403, Value::Null);
                Ok(Flow::Halt)
            }),
        );
        registry
    }

    fn api(registry: &MiddlewareRegistry) -> Api {
        let mut controllers = ControllerRegistry::new();
        controllers.register(
            ControllerRegistration::of::<Items>("items")
                .prefix("/items")
                .route(
                    RouteRegistration::new("get")
                        .path(":id")
                        .validate_params(Validator::new(require_id))
                        .handle(Items::get),
                )
                .route(
                    RouteRegistration::new("secret")
                        .verbs([Verb::Get, Verb::Post])
                        .middleware([MiddlewareRef::key("deny")])
                        .handle(Items::get),
                )
                .route(RouteRegistration::new("delete").path("fail").handle(Items::fail)),
        );
        RuntimeCompiler::new(&controllers).compile(registry)
    }

    #[test]
    fn test_binds_every_verb() {
        let registry = registry();
        let mut table = RouteTable::new();
        let bound = RouteBuilder::new(&registry).build(&api(&registry), &mut table).unwrap();
        assert_eq!(bound, 4);
        let keys: Vec<(Verb, &str)> = table.keys().collect();
        assert_eq!(
            keys,
            vec![
                (Verb::Get, "/items/:id"),
                (Verb::Get, "/items/secret"),
                (Verb::Post, "/items/secret"),
                (Verb::Delete, "/items/fail"),
            ]
        );
    }

    #[test]
    fn test_chain_runs_validators_then_fresh_instance() {
        let registry = registry();
        let mut table = RouteTable::new();
        RouteBuilder::new(&registry).build(&api(&registry), &mut table).unwrap();

        for _ in 0..2 {
            let mut req = ApiRequest::new(Value::Null, json!({ "id": "7" }), Value::Null);
            table.dispatch(Verb::Get, "/items/:id", &mut req).unwrap();
            assert_eq!(req.response, Some(json!({ "id": "7", "calls": 1 })));
        }

        let mut req = ApiRequest::default();
        let err = table.dispatch(Verb::Get, "/items/:id", &mut req).unwrap_err();
        assert_eq!(err.to_string(), "id is required");
        assert!(!req.is_sent());
    }

    #[test]
    fn test_halt_and_errors() {
        let registry = registry();
        let mut table = RouteTable::new();
        RouteBuilder::new(&registry).build(&api(&registry), &mut table).unwrap();

        let mut req = ApiRequest::default();
        table.dispatch(Verb::Post, "/items/secret", &mut req).unwrap();
        assert_eq!(req.status, Some(403));

        let err = table
            .dispatch(Verb::Delete, "/items/fail", &mut ApiRequest::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_invalid_api_not_bound() {
        let empty = MiddlewareRegistry::new();
        let api = api(&empty);
        assert!(!api.is_valid());

        let mut table = RouteTable::new();
        let result = RouteBuilder::new(&empty).build(&api, &mut table);
        assert!(matches!(result, Err(AppError::Bind(_))));
        assert!(table.is_empty());
    }
}
