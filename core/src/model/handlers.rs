#![deny(missing_docs)]

//! # Handlers
//!
//! Type-erased function references stored on descriptors, plus the request
//! adapter they operate on. Host frameworks fill an [`ApiRequest`] from their
//! native request and read the response back after the chain ran.

use serde_json::Value;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// Error raised by handlers, validators and middleware.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a handler invocation.
pub type HandlerResult = Result<(), HandlerError>;

/// Framework-neutral request/response adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRequest {
    /// Parsed request body.
    pub body: Value,
    /// Path parameters.
    pub params: Value,
    /// Query string values.
    pub query: Value,
    /// Status set by `send`.
    pub status: Option<u16>,
    /// Body set by `send`.
    pub response: Option<Value>,
}

impl ApiRequest {
    /// Builds a request from its three inputs.
    pub fn new(body: Value, params: Value, query: Value) -> Self {
        Self {
            body,
            params,
            query,
            ..Default::default()
        }
    }

    /// Records the response.
    pub fn send(&mut self, status: u16, body: Value) {
        self.status = Some(status);
        self.response = Some(body);
    }

    /// True once a response was recorded.
    pub fn is_sent(&self) -> bool {
        self.status.is_some()
    }
}

type ErasedHandler = dyn Fn(&mut dyn Any, &mut ApiRequest) -> HandlerResult + Send + Sync;

/// A route handler, invoked on a controller instance.
#[derive(Clone)]
pub struct RouteHandler(Arc<ErasedHandler>);

impl RouteHandler {
    /// Wraps a method-like function on controller type `C`.
    pub fn new<C, F>(f: F) -> Self
    where
        C: 'static,
        F: Fn(&mut C, &mut ApiRequest) -> HandlerResult + Send + Sync + 'static,
    {
        Self(Arc::new(move |instance: &mut dyn Any, req: &mut ApiRequest| {
            match instance.downcast_mut::<C>() {
                Some(controller) => f(controller, req),
                None => Err(format!("controller instance is not a {}", type_name::<C>()).into()),
            }
        }))
    }

    /// Invokes the handler.
    pub fn call(&self, instance: &mut dyn Any, req: &mut ApiRequest) -> HandlerResult {
        (self.0)(instance, req)
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RouteHandler(..)")
    }
}

type ErasedFactory = dyn Fn() -> Box<dyn Any + Send> + Send + Sync;

/// Creates a fresh controller instance per request.
#[derive(Clone)]
pub struct ControllerFactory(Arc<ErasedFactory>);

impl ControllerFactory {
    /// A factory from a constructor function.
    pub fn new<C, F>(f: F) -> Self
    where
        C: Send + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self(Arc::new(move || Box::new(f()) as Box<dyn Any + Send>))
    }

    /// A factory using `C::default()`.
    pub fn of<C: Default + Send + 'static>() -> Self {
        Self::new(C::default)
    }

    /// Builds an instance.
    pub fn create(&self) -> Box<dyn Any + Send> {
        (self.0)()
    }
}

impl fmt::Debug for ControllerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ControllerFactory(..)")
    }
}

type ErasedValidator = dyn Fn(Value) -> Result<Value, HandlerError> + Send + Sync;

/// Validates (and may normalise) one request input.
#[derive(Clone)]
pub struct Validator(Arc<ErasedValidator>);

impl Validator {
    /// Wraps a validation function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Runs the validator.
    pub fn validate(&self, value: Value) -> Result<Value, HandlerError> {
        (self.0)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}
