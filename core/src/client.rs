#![deny(missing_docs)]

//! # Client Model
//!
//! The input of client code generators: every controller with its typed
//! routes, plus the TypeScript declarations of every reference type. Built
//! from a statically compiled [`Api`]; templating it into source text is left
//! to the generator.

use crate::model::{Api, MiddlewareRef, Verb};
use crate::types::{render_declaration, render_type};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One typed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClientRoute {
    /// Member name.
    pub name: String,
    /// Full route path.
    pub route: String,
    /// Accepted verbs.
    pub verbs: Vec<Verb>,
    /// Content type.
    pub content_type: String,
    /// Middleware references.
    pub middleware: Vec<MiddlewareRef>,
    /// Body type expression.
    pub body_type: String,
    /// Query string type expression.
    pub query_type: String,
    /// Path parameters type expression.
    pub params_type: String,
    /// Response type expression.
    pub response_type: String,
}

/// One controller and its typed routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClientController {
    /// Controller name.
    pub type_name: String,
    /// Typed routes.
    pub routes: Vec<ApiClientRoute>,
}

/// Client generator input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiClient {
    /// Reference type declarations, without the `export` keyword.
    pub refs: Vec<String>,
    /// Controllers with at least one typed route.
    pub controllers: Vec<ApiClientController>,
}

impl ApiClient {
    /// Builds the client model. Routes without request types are skipped.
    pub fn from_api(api: &Api) -> Self {
        let refs = api
            .reference_types_slice()
            .iter()
            .filter_map(render_declaration)
            .map(|declaration| match declaration.strip_prefix("export ") {
                Some(rest) => rest.to_string(),
                None => declaration,
            })
            .collect();

        let mut controllers = Vec::new();
        for controller in &api.controllers {
            let mut routes = Vec::new();
            for route in &controller.routes {
                let Some(types) = &route.request_types else {
                    warn!(
                        "Unable to extract types from controller '{}' member: '{}'",
                        controller.name, route.member_name
                    );
                    continue;
                };
                routes.push(ApiClientRoute {
                    name: route.member_name.clone(),
                    route: route.path.clone(),
                    verbs: route.verbs.clone(),
                    content_type: route.content_type.clone(),
                    middleware: route.middleware.clone(),
                    body_type: render_type(&types.request),
                    query_type: render_type(&types.query_string),
                    params_type: render_type(&types.params),
                    response_type: render_type(&types.response),
                });
            }
            if !routes.is_empty() {
                controllers.push(ApiClientController {
                    type_name: controller.name.clone(),
                    routes,
                });
            }
        }
        Self { refs, controllers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ControllerDescriptor, RouteDescriptor};
    use crate::types::{ApiMember, ApiType, RouteTypes, TypeKind};
    use pretty_assertions::assert_eq;

    fn route(member: &str, request_types: Option<RouteTypes>) -> RouteDescriptor {
        RouteDescriptor {
            name: format!("simple_{}", member),
            member_name: member.to_string(),
            path: "/simple".to_string(),
            verbs: vec![Verb::Get],
            content_type: "application/json".to_string(),
            middleware: vec![MiddlewareRef::key("one")],
            handler: None,
            validate_body: None,
            validate_params: None,
            validate_query: None,
            request_types,
        }
    }

    #[test]
    fn test_from_api() {
        let mut simple = ApiType::named(TypeKind::Interface, "ISimple");
        simple.members = Some(vec![ApiMember::field("id", ApiType::simple("string"), false)]);
        let types = RouteTypes {
            request: ApiType::void(),
            response: ApiType::named(TypeKind::InterfaceRef, "ISimple").into_array(),
            params: ApiType::void(),
            query_string: ApiType::anonymous(vec![ApiMember::field(
                "page",
                ApiType::simple("number"),
                true,
            )]),
        };
        let api = Api {
            errors: Vec::new(),
            controllers: vec![
                ControllerDescriptor {
                    name: "simple".to_string(),
                    route_prefix: Some("/simple".to_string()),
                    middleware: Vec::new(),
                    routes: vec![route("getAll", Some(types)), route("untyped", None)],
                    factory: None,
                },
                ControllerDescriptor {
                    name: "runtime".to_string(),
                    route_prefix: None,
                    middleware: Vec::new(),
                    routes: vec![route("get", None)],
                    factory: None,
                },
            ],
            reference_types: Some(vec![simple]),
        };

        let client = ApiClient::from_api(&api);
        assert_eq!(client.refs, vec!["interface ISimple {\n  id: string;\n}"]);
        assert_eq!(client.controllers.len(), 1);
        let routes = &client.controllers[0].routes;
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].name, "getAll");
        assert_eq!(routes[0].body_type, "void");
        assert_eq!(routes[0].response_type, "ISimple[]");
        assert_eq!(routes[0].query_type, "{ page?: number; }");
    }
}
