#![deny(missing_docs)]

//! # Runtime Compiler
//!
//! Assembles controllers from a [`ControllerRegistry`] populated at startup.

use super::MetadataCompiler;
use crate::builder::ApiBuilder;
use crate::config::CompilerConfig;
use crate::middleware::MiddlewareRegistry;
use crate::model::{Api, ControllerDescriptor};
use crate::registration::ControllerRegistry;
use tracing::{debug, trace};

/// Builds an [`Api`] from registered controllers.
#[derive(Debug, Clone)]
pub struct RuntimeCompiler<'a> {
    controllers: &'a ControllerRegistry,
    config: CompilerConfig,
}

impl<'a> RuntimeCompiler<'a> {
    /// Creates a compiler over `controllers` with default settings.
    pub fn new(controllers: &'a ControllerRegistry) -> Self {
        Self::with_config(controllers, CompilerConfig::default())
    }

    /// Creates a compiler with explicit settings.
    pub fn with_config(controllers: &'a ControllerRegistry, config: CompilerConfig) -> Self {
        Self { controllers, config }
    }

    fn describe_all(&self) -> Vec<ControllerDescriptor> {
        let mut described = Vec::new();
        for controller in self.controllers.get_all() {
            let routes: Vec<_> = controller
                .routes
                .iter()
                .filter(|route| {
                    if route.handler.is_none() {
                        trace!(
                            "{}.{} has no handler (ignored)",
                            controller.name,
                            route.member
                        );
                        return false;
                    }
                    true
                })
                .map(|route| controller.describe_route(route, &self.config))
                .collect();

            if routes.is_empty() {
                trace!("{} > no routes found (ignored)", controller.name);
                continue;
            }
            described.push(controller.describe(routes));
        }
        described
    }
}

impl MetadataCompiler for RuntimeCompiler<'_> {
    fn compile(&mut self, middleware: &MiddlewareRegistry) -> Api {
        debug!(
            "Runtime compile started ({} controllers)",
            self.controllers.len()
        );
        let api = ApiBuilder::new(middleware).build(self.describe_all());
        debug!(
            "Runtime compile completed: {} controllers, {} errors",
            api.controllers.len(),
            api.errors.len()
        );
        api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApiRequest, Verb};
    use crate::registration::{ControllerRegistration, RouteRegistration};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Default)]
    struct Users;

    impl Users {
        fn get(&mut self, req: &mut ApiRequest) -> crate::model::HandlerResult {
            req.send(200, json!({ "id": req.params["id"] }));
            Ok(())
        }
    }

    #[test]
    fn test_routes_without_handler_skipped() {
        let mut registry = ControllerRegistry::new();
        registry.register(
            ControllerRegistration::of::<Users>("users")
                .prefix("/users")
                .route(RouteRegistration::new("get").path(":id").handle(Users::get))
                .route(RouteRegistration::new("post")),
        );
        registry.register(ControllerRegistration::of::<Users>("idle").route(RouteRegistration::new("get")));

        let api = RuntimeCompiler::new(&registry).compile(&MiddlewareRegistry::new());
        assert!(api.is_valid());
        assert_eq!(api.controllers.len(), 1);
        let route = &api.controllers[0].routes[0];
        assert_eq!(route.name, "users_get");
        assert_eq!(route.path, "/users/:id");
        assert_eq!(route.verbs, vec![Verb::Get]);
        assert!(api.reference_types.is_none());
    }
}
