#![deny(missing_docs)]

//! # Compiler Configuration
//!
//! Names the compilers look for in source, and route defaults. Loadable from
//! YAML; every field falls back to its default.

use crate::error::{AppError, AppResult};
use crate::naming::DEFAULT_CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings shared by the runtime and source compilers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Generic request types with 4 arguments: body, response, params, query.
    pub typed_request_types: Vec<String>,
    /// Generic request types with 3 arguments: response, params, query.
    pub void_request_types: Vec<String>,
    /// Decorator names marking a controller class.
    pub controller_decorators: Vec<String>,
    /// Content type for routes that do not declare one.
    pub default_content_type: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            typed_request_types: vec!["IApiRequest".to_string()],
            void_request_types: vec!["IApiVoidRequest".to_string()],
            controller_decorators: vec!["controller".to_string(), "include".to_string()],
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

/// Shape of a request marker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// `(body, response, params, query)`.
    Typed,
    /// `(response, params, query)` with a `void` body.
    Void,
}

impl RequestShape {
    /// Number of generic arguments the shape takes.
    pub fn arity(self) -> usize {
        match self {
            RequestShape::Typed => 4,
            RequestShape::Void => 3,
        }
    }
}

impl CompilerConfig {
    /// Parses YAML text.
    pub fn from_yaml(text: &str) -> AppResult<Self> {
        serde_yaml::from_str(text).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Reads and parses a YAML file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// The request shape a type name stands for, if it is a marker.
    pub fn request_shape(&self, name: &str) -> Option<RequestShape> {
        if self.typed_request_types.iter().any(|n| n == name) {
            Some(RequestShape::Typed)
        } else if self.void_request_types.iter().any(|n| n == name) {
            Some(RequestShape::Void)
        } else {
            None
        }
    }

    /// True when `name` marks a controller class.
    pub fn is_controller_decorator(&self, name: &str) -> bool {
        self.controller_decorators.iter().any(|n| n == name)
    }
}
