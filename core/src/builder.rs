#![deny(missing_docs)]

//! # Api Builder
//!
//! Final validation shared by both compilers: drops controllers without
//! routes, detects (path, verb) clashes and resolves middleware references.

use crate::error::BuildError;
use crate::explorer::{all_middleware_refs, for_each_route};
use crate::middleware::{resolve, MiddlewareRegistry};
use crate::model::{Api, ControllerDescriptor, Verb};
use indexmap::IndexMap;
use tracing::{error, trace};

/// Validates controller descriptors into an [`Api`].
#[derive(Debug, Clone, Copy)]
pub struct ApiBuilder<'r> {
    registry: &'r MiddlewareRegistry,
}

impl<'r> ApiBuilder<'r> {
    /// Creates a builder resolving against `registry`.
    pub fn new(registry: &'r MiddlewareRegistry) -> Self {
        Self { registry }
    }

    /// Builds an Api from `controllers`.
    pub fn build(&self, controllers: Vec<ControllerDescriptor>) -> Api {
        self.build_with_errors(controllers, Vec::new())
    }

    /// Builds an Api, appending validation errors after `errors` already
    /// recorded by the calling compiler.
    pub fn build_with_errors(
        &self,
        controllers: Vec<ControllerDescriptor>,
        mut errors: Vec<BuildError>,
    ) -> Api {
        let controllers: Vec<ControllerDescriptor> = controllers
            .into_iter()
            .filter(|c| {
                if c.routes.is_empty() {
                    trace!("Controller '{}' has no routes (ignored)", c.name);
                    return false;
                }
                true
            })
            .collect();

        let found = duplicate_routes(&controllers)
            .into_iter()
            .chain(middleware_errors(&controllers, self.registry));
        for err in found {
            error!("{}", err);
            errors.push(err);
        }

        Api {
            errors,
            controllers,
            reference_types: None,
        }
    }
}

fn duplicate_routes(controllers: &[ControllerDescriptor]) -> Vec<BuildError> {
    let mut groups: IndexMap<(&str, Verb), Vec<String>> = IndexMap::new();
    for_each_route(controllers, |controller, route| {
        for verb in &route.verbs {
            groups
                .entry((route.path.as_str(), *verb))
                .or_default()
                .push(format!("{}.{}", controller.name, route.member_name));
        }
    });

    groups
        .into_iter()
        .filter(|(_, offenders)| offenders.len() > 1)
        .map(|((path, verb), offenders)| BuildError::DuplicateRoute {
            verb: verb.to_string(),
            path: path.to_string(),
            offenders,
        })
        .collect()
}

fn middleware_errors(
    controllers: &[ControllerDescriptor],
    registry: &MiddlewareRegistry,
) -> Vec<BuildError> {
    match resolve(all_middleware_refs(controllers), registry) {
        Ok(_) => Vec::new(),
        Err(errors) => errors,
    }
}
