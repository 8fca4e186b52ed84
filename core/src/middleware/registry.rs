#![deny(missing_docs)]

//! # Middleware Registry
//!
//! Process-scoped map from middleware key to function or provider. Built once
//! and passed explicitly to the builder and route builder.

use super::{MiddlewareFunc, MiddlewareFunction, MiddlewareHandler, MiddlewareProvider};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A middleware key discovered in source, without a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiddlewareDeclaration {
    /// Registered key.
    pub key: String,
    /// Declared `(min, max)` parameter bounds for providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<(usize, usize)>,
}

/// Registry of middleware entries, in registration order.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareRegistry {
    entries: IndexMap<String, MiddlewareFunction>,
}

impl MiddlewareRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plain function. Replaces an existing entry with the same key.
    pub fn register_function(&mut self, key: impl Into<String>, func: MiddlewareHandler) -> &mut Self {
        self.insert(key.into(), MiddlewareFunc::Plain(func))
    }

    /// Registers a provider accepting between `min` and `max` parameters.
    ///
    /// `max` below `min` is raised to `min`.
    pub fn register_provider(
        &mut self,
        key: impl Into<String>,
        provider: MiddlewareProvider,
        min: usize,
        max: usize,
    ) -> &mut Self {
        self.insert(
            key.into(),
            MiddlewareFunc::Provider {
                provider,
                min,
                max: max.max(min),
            },
        )
    }

    /// Registers a declaration found in source with a pass-through body.
    pub fn register_declaration(&mut self, declaration: &MiddlewareDeclaration) -> &mut Self {
        match declaration.params {
            Some((min, max)) => self.register_provider(
                declaration.key.clone(),
                MiddlewareProvider::passthrough(),
                min,
                max,
            ),
            None => self.register_function(declaration.key.clone(), MiddlewareHandler::passthrough()),
        }
    }

    /// Registry seeded from declarations.
    pub fn from_declarations<'a>(declarations: impl IntoIterator<Item = &'a MiddlewareDeclaration>) -> Self {
        let mut registry = Self::new();
        for declaration in declarations {
            registry.register_declaration(declaration);
        }
        registry
    }

    fn insert(&mut self, key: String, func: MiddlewareFunc) -> &mut Self {
        if self.entries.contains_key(&key) {
            debug!("Replacing middleware registration '{}'", key);
        }
        self.entries.insert(key.clone(), MiddlewareFunction { key, func });
        self
    }

    /// Looks up an entry.
    pub fn get(&self, key: &str) -> Option<&MiddlewareFunction> {
        self.entries.get(key)
    }

    /// True when the key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All entries in registration order.
    pub fn get_all(&self) -> Vec<&MiddlewareFunction> {
        self.entries.values().collect()
    }

    /// The underlying key map.
    pub fn as_map(&self) -> &IndexMap<String, MiddlewareFunction> {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
