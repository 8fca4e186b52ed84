#![deny(missing_docs)]

//! # Middleware
//!
//! Keyed middleware functions and providers, and resolution of the
//! references used by compiled routes.

use crate::model::{ApiRequest, HandlerError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Key to function registry.
pub mod registry;

/// Reference validation and resolution.
pub mod resolver;

pub use registry::MiddlewareRegistry;
pub use resolver::{resolve, ResolvedMiddleware};

/// What a middleware step decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Continue with the next step.
    Next,
    /// Stop the chain; the middleware produced the response.
    Halt,
}

type ErasedMiddleware = dyn Fn(&mut ApiRequest) -> Result<Flow, HandlerError> + Send + Sync;
type ErasedProvider = dyn Fn(&[Value]) -> MiddlewareHandler + Send + Sync;

/// An invokable middleware step.
#[derive(Clone)]
pub struct MiddlewareHandler(Arc<ErasedMiddleware>);

impl MiddlewareHandler {
    /// Wraps a middleware function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut ApiRequest) -> Result<Flow, HandlerError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A step that always continues.
    pub fn passthrough() -> Self {
        Self::new(|_| Ok(Flow::Next))
    }

    /// Runs the step.
    pub fn call(&self, req: &mut ApiRequest) -> Result<Flow, HandlerError> {
        (self.0)(req)
    }
}

impl fmt::Debug for MiddlewareHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MiddlewareHandler(..)")
    }
}

/// Produces a middleware step from bound parameters.
#[derive(Clone)]
pub struct MiddlewareProvider(Arc<ErasedProvider>);

impl MiddlewareProvider {
    /// Wraps a provider function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> MiddlewareHandler + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A provider whose steps always continue.
    pub fn passthrough() -> Self {
        Self::new(|_| MiddlewareHandler::passthrough())
    }

    /// Invokes the provider.
    pub fn invoke(&self, params: &[Value]) -> MiddlewareHandler {
        (self.0)(params)
    }
}

impl fmt::Debug for MiddlewareProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MiddlewareProvider(..)")
    }
}

/// Registered callable behind a key.
#[derive(Debug, Clone)]
pub enum MiddlewareFunc {
    /// Plain function, zero parameters expected.
    Plain(MiddlewareHandler),
    /// Provider accepting between `min` and `max` parameters.
    Provider {
        /// Provider function.
        provider: MiddlewareProvider,
        /// Minimum parameter count.
        min: usize,
        /// Maximum parameter count.
        max: usize,
    },
}

/// A middleware registry entry.
#[derive(Debug, Clone)]
pub struct MiddlewareFunction {
    /// Global key.
    pub key: String,
    /// Callable.
    pub func: MiddlewareFunc,
}

impl MiddlewareFunction {
    /// Declared `(min, max)` arity; `None` for plain functions.
    pub fn param_range(&self) -> Option<(usize, usize)> {
        match self.func {
            MiddlewareFunc::Plain(_) => None,
            MiddlewareFunc::Provider { min, max, .. } => Some((min, max)),
        }
    }
}
