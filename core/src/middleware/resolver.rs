#![deny(missing_docs)]

//! # Middleware Resolver
//!
//! Checks every distinct middleware reference against the registry and turns
//! it into an invokable step. Providers are invoked once per distinct
//! reference with their bound parameters.

use super::{MiddlewareFunc, MiddlewareHandler, MiddlewareRegistry};
use crate::error::BuildError;
use crate::model::{render_param, MiddlewareRef};
use indexmap::{IndexMap, IndexSet};
use tracing::warn;

/// Invokable steps keyed by the canonical form of each reference.
#[derive(Debug, Clone, Default)]
pub struct ResolvedMiddleware {
    handlers: IndexMap<String, MiddlewareHandler>,
}

impl ResolvedMiddleware {
    /// Step for a reference.
    pub fn get(&self, reference: &MiddlewareRef) -> Option<&MiddlewareHandler> {
        self.handlers.get(&reference.to_string())
    }

    /// Steps for an ordered list of references, skipping unknown ones.
    pub fn chain(&self, references: &[MiddlewareRef]) -> Vec<MiddlewareHandler> {
        references
            .iter()
            .filter_map(|r| self.get(r).cloned())
            .collect()
    }

    /// Canonical reference strings in first-seen order.
    pub fn keys(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Number of resolved references.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Resolves references against the registry.
///
/// Missing keys are reported once per key. Parameters passed to a plain
/// function are dropped with a warning.
pub fn resolve<'a>(
    references: impl IntoIterator<Item = &'a MiddlewareRef>,
    registry: &MiddlewareRegistry,
) -> Result<ResolvedMiddleware, Vec<BuildError>> {
    let mut distinct: IndexMap<String, &MiddlewareRef> = IndexMap::new();
    for reference in references {
        distinct.entry(reference.to_string()).or_insert(reference);
    }

    let mut errors = Vec::new();
    let mut missing: IndexSet<&str> = IndexSet::new();
    let mut resolved = ResolvedMiddleware::default();

    for (canonical, reference) in distinct {
        let key = reference.key_str();
        let params = reference.params();
        let Some(entry) = registry.get(key) else {
            if missing.insert(key) {
                errors.push(match reference {
                    MiddlewareRef::Key(_) => BuildError::MissingMiddleware(key.to_string()),
                    MiddlewareRef::Provider { .. } => {
                        BuildError::MissingMiddlewareProvider(key.to_string())
                    }
                });
            }
            continue;
        };

        match &entry.func {
            MiddlewareFunc::Plain(handler) => {
                if !params.is_empty() {
                    warn!(
                        "Middleware function: '{}' does not require parameters, but is being invoked with values that will never be used",
                        key
                    );
                }
                resolved.handlers.insert(canonical, handler.clone());
            }
            MiddlewareFunc::Provider { provider, min, max } => {
                let count = params.len();
                if count >= *min && count <= *max {
                    resolved.handlers.insert(canonical, provider.invoke(params));
                } else if params.is_empty() {
                    errors.push(BuildError::MiddlewareParamsMissing {
                        key: key.to_string(),
                        min: *min,
                        max: *max,
                    });
                } else {
                    errors.push(BuildError::MiddlewareArityMismatch {
                        key: key.to_string(),
                        params: params.iter().map(render_param).collect(),
                        min: *min,
                        max: *max,
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(resolved)
    } else {
        Err(errors)
    }
}
