#![deny(missing_docs)]

//! # Api Model
//!
//! The normalized output of both metadata compilers: controllers, routes,
//! middleware references and accumulated build errors.

use crate::error::BuildError;
use crate::types::{ApiType, RouteTypes};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Function references carried by descriptors.
pub mod handlers;

pub use handlers::{ApiRequest, ControllerFactory, HandlerError, HandlerResult, RouteHandler, Validator};

/// HTTP verbs a route can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// OPTIONS
    Options,
    /// GET
    Get,
    /// HEAD
    Head,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
}

impl Verb {
    /// Every accepted verb token.
    pub const ALL: [Verb; 7] = [
        Verb::Options,
        Verb::Get,
        Verb::Head,
        Verb::Post,
        Verb::Put,
        Verb::Delete,
        Verb::Patch,
    ];

    /// Lowercase token.
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Options => "options",
            Verb::Get => "get",
            Verb::Head => "head",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Delete => "delete",
            Verb::Patch => "patch",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("'{}' is not an accepted verb", s))
    }
}

/// A reference from a route to a registered middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MiddlewareRef {
    /// A bare key.
    Key(String),
    /// A provider invocation with bound parameters.
    Provider {
        /// Registered key.
        key: String,
        /// Parameters passed to the provider.
        params: Vec<Value>,
    },
}

impl MiddlewareRef {
    /// A bare key reference.
    pub fn key(key: impl Into<String>) -> Self {
        MiddlewareRef::Key(key.into())
    }

    /// A provider invocation. No parameters collapses to a bare key.
    pub fn provider(key: impl Into<String>, params: Vec<Value>) -> Self {
        if params.is_empty() {
            MiddlewareRef::Key(key.into())
        } else {
            MiddlewareRef::Provider {
                key: key.into(),
                params,
            }
        }
    }

    /// Registered key this reference points at.
    pub fn key_str(&self) -> &str {
        match self {
            MiddlewareRef::Key(key) | MiddlewareRef::Provider { key, .. } => key,
        }
    }

    /// Bound parameters (empty for a bare key).
    pub fn params(&self) -> &[Value] {
        match self {
            MiddlewareRef::Key(_) => &[],
            MiddlewareRef::Provider { params, .. } => params,
        }
    }
}

/// Renders a parameter the way it appears in messages: strings raw, the rest as JSON.
pub fn render_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Canonical form: `key` or `key(p1,p2)`.
impl fmt::Display for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareRef::Key(key) => f.write_str(key),
            MiddlewareRef::Provider { key, params } => {
                let rendered: Vec<String> = params.iter().map(Value::to_string).collect();
                write!(f, "{}({})", key, rendered.join(","))
            }
        }
    }
}

/// One compiled route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    /// `controller_member`.
    pub name: String,
    /// Member the route was declared on.
    pub member_name: String,
    /// Full path including the controller prefix.
    pub path: String,
    /// Accepted verbs, never empty.
    pub verbs: Vec<Verb>,
    /// Response content type.
    pub content_type: String,
    /// Controller references followed by route references.
    pub middleware: Vec<MiddlewareRef>,
    /// Handler invoked on a fresh controller instance.
    #[serde(skip)]
    pub handler: Option<RouteHandler>,
    /// Body validator.
    #[serde(skip)]
    pub validate_body: Option<Validator>,
    /// Path parameter validator.
    #[serde(skip)]
    pub validate_params: Option<Validator>,
    /// Query string validator.
    #[serde(skip)]
    pub validate_query: Option<Validator>,
    /// Resolved request contract (static compiler only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_types: Option<RouteTypes>,
}

/// One compiled controller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerDescriptor {
    /// Controller name, namespace for route names.
    pub name: String,
    /// Path prefix shared by every route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_prefix: Option<String>,
    /// References applied to every route.
    pub middleware: Vec<MiddlewareRef>,
    /// Compiled routes.
    pub routes: Vec<RouteDescriptor>,
    /// Creates controller instances for handler invocation.
    #[serde(skip)]
    pub factory: Option<ControllerFactory>,
}

/// The complete output of one compile call.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    /// Accumulated build errors. Non-empty means the model must not be bound.
    pub errors: Vec<BuildError>,
    /// Controllers with at least one route.
    pub controllers: Vec<ControllerDescriptor>,
    /// Deduplicated expanded interfaces and enums (static compiler only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_types: Option<Vec<ApiType>>,
}

impl Api {
    /// True when no build errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages in recorded order.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Finds a route by its `controller_member` name.
    pub fn find_route(&self, name: &str) -> Option<&RouteDescriptor> {
        self.controllers
            .iter()
            .flat_map(|c| c.routes.iter())
            .find(|r| r.name == name)
    }

    /// Reference types as a slice.
    pub fn reference_types_slice(&self) -> &[ApiType] {
        self.reference_types.as_deref().unwrap_or_default()
    }
}
