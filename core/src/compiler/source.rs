#![deny(missing_docs)]

//! # Source Code Compiler
//!
//! Builds an [`Api`] by reading decorated TypeScript controllers.
//!
//! Controller classes are selected by their class decorator (see
//! [`CompilerConfig::controller_decorators`]). Members carrying a `route`
//! decorator become routes; their single request parameter must be typed
//! with one of the configured request marker types, whose generic arguments
//! are resolved into the route's [`RouteTypes`].
//!
//! Handlers cannot be recovered from source. Attach a [`ControllerRegistry`]
//! to bind handlers, validators and factories registered at runtime.

use super::MetadataCompiler;
use crate::builder::ApiBuilder;
use crate::config::{CompilerConfig, RequestShape};
use crate::error::{AppResult, BuildError};
use crate::middleware::registry::MiddlewareDeclaration;
use crate::middleware::MiddlewareRegistry;
use crate::model::{Api, ControllerDescriptor, MiddlewareRef, RouteDescriptor, Verb};
use crate::registration::{ControllerRegistration, ControllerRegistry, RouteRegistration};
use crate::resolver::TypeResolver;
use crate::source::decorators::{literal, middleware_refs};
use crate::source::{Decorator, SourceNode, SourceProgram};
use crate::types::{ApiType, RouteTypes};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, trace, warn};

const CLASS_KINDS: [&str; 2] = ["class_declaration", "abstract_class_declaration"];

/// Static compiler over a parsed program.
#[derive(Debug)]
pub struct SourceCodeCompiler<'a> {
    program: SourceProgram,
    config: CompilerConfig,
    load_errors: Vec<BuildError>,
    controllers: Option<&'a ControllerRegistry>,
}

impl<'a> SourceCodeCompiler<'a> {
    /// Reads and parses `paths`.
    ///
    /// Unreadable paths are reported in the compiled Api's errors, not here.
    pub fn load<P: AsRef<Path>>(paths: &[P], config: CompilerConfig) -> AppResult<Self> {
        let (program, load_errors) = SourceProgram::load(paths)?;
        Ok(Self {
            program,
            config,
            load_errors,
            controllers: None,
        })
    }

    /// Compiles an already parsed program.
    pub fn from_program(program: SourceProgram, config: CompilerConfig) -> Self {
        Self {
            program,
            config,
            load_errors: Vec::new(),
            controllers: None,
        }
    }

    /// Matches runtime registrations to compiled routes by controller and member name.
    pub fn with_controllers(mut self, controllers: &'a ControllerRegistry) -> Self {
        self.controllers = Some(controllers);
        self
    }

    /// The parsed program.
    pub fn program(&self) -> &SourceProgram {
        &self.program
    }

    /// Middleware keys declared in source through `middlewareFunction(key)`
    /// and `middlewareProviderFunction(key, min, max?)` decorators.
    pub fn middleware_declarations(&self) -> Vec<MiddlewareDeclaration> {
        let mut declarations = Vec::new();
        for decorator in self
            .program
            .find_all(&["decorator"])
            .into_iter()
            .filter_map(Decorator::parse)
        {
            let params = match decorator.name {
                "middlewareFunction" => None,
                "middlewareProviderFunction" => {
                    let min = decorator.count_arg(1).unwrap_or(0);
                    Some((min, decorator.count_arg(2).unwrap_or(min)))
                }
                _ => continue,
            };
            match decorator.string_arg(0) {
                Some(key) => declarations.push(MiddlewareDeclaration { key, params }),
                None => warn!("Ignoring {} without a key", decorator.name),
            }
        }
        declarations
    }

    fn compile_class<'p>(
        &self,
        class: SourceNode<'p>,
        resolver: &mut TypeResolver<'p>,
    ) -> Option<ControllerDescriptor> {
        let decorators = Decorator::of(class);
        let marker = decorators
            .iter()
            .find(|d| self.config.is_controller_decorator(d.name))?;
        let class_name = class.field_text("name").unwrap_or_default();

        let mut controller =
            ControllerRegistration::new(marker.string_arg(0).unwrap_or_else(|| class_name.to_string()));
        if let Some(prefix) = marker.string_arg(1) {
            controller = controller.prefix(prefix);
        }
        if let Some(refs) = marker.args.get(2) {
            controller = controller.middleware(middleware_refs(*refs));
        }
        let registered = self.controllers.and_then(|r| r.find(&controller.name));
        if let Some(factory) = registered.and_then(|r| r.factory.clone()) {
            controller = controller.factory(factory);
        }
        trace!("Controller '{}' found at {}", controller.name, class.location());

        let class_params = class.type_parameter_names();
        let mut routes = Vec::new();
        let mut pending: Vec<Decorator<'p>> = Vec::new();
        let members = class.field("body").map(|b| b.children()).unwrap_or_default();
        for member in members {
            match member.kind() {
                "decorator" => pending.extend(Decorator::parse(member)),
                "method_definition" | "public_field_definition" => {
                    let mut member_decorators = std::mem::take(&mut pending);
                    member_decorators.extend(
                        member
                            .fields("decorator")
                            .into_iter()
                            .filter_map(Decorator::parse),
                    );
                    let route = self.compile_route(
                        &controller,
                        registered,
                        member,
                        &member_decorators,
                        &class_params,
                        resolver,
                    );
                    routes.extend(route);
                }
                _ => pending.clear(),
            }
        }

        if let Some(registered) = registered {
            for route in &registered.routes {
                if !routes.iter().any(|r| r.member_name == route.member) {
                    resolver.record(BuildError::MissingSourceNode {
                        controller: controller.name.clone(),
                        member: route.member.clone(),
                    });
                }
            }
        }
        Some(controller.describe(routes))
    }

    fn compile_route<'p>(
        &self,
        controller: &ControllerRegistration,
        registered: Option<&ControllerRegistration>,
        member: SourceNode<'p>,
        decorators: &[Decorator<'p>],
        class_params: &[String],
        resolver: &mut TypeResolver<'p>,
    ) -> Option<RouteDescriptor> {
        let member_name = member.field_text("name")?;
        let Some(route_decorator) = decorators.iter().find(|d| d.name == "route") else {
            trace!("{}.{} has no route decorator (ignored)", controller.name, member_name);
            return None;
        };
        let Some(function) = handler_function(member) else {
            trace!("{}.{} is not a function (ignored)", controller.name, member_name);
            return None;
        };

        let mut route = RouteRegistration::new(member_name);
        if let Some(path) = route_decorator.string_arg(0) {
            route = route.path(path);
        }
        // Decorators apply bottom-up, so the outermost verbs declaration is the one in effect.
        let mut verbs: Option<Vec<Verb>> = None;
        for decorator in decorators {
            match decorator.name {
                "acceptVerbs" | "verbs" if verbs.is_some() => warn!(
                    "{}.{}: ignoring repeated {} declaration",
                    controller.name, member_name, decorator.name
                ),
                "acceptVerbs" | "verbs" => {
                    let mut accepted = Vec::new();
                    for token in decorator.string_args() {
                        match token.parse::<Verb>() {
                            Ok(verb) => accepted.push(verb),
                            Err(e) => warn!("{}.{}: {}", controller.name, member_name, e),
                        }
                    }
                    verbs = Some(accepted);
                }
                "middleware" => route = route.middleware(route_middleware(decorator)),
                "contentType" => {
                    if let Some(content_type) = decorator.string_arg(0) {
                        route = route.content_type(content_type);
                    }
                }
                _ => {}
            }
        }
        if let Some(verbs) = verbs.filter(|v| !v.is_empty()) {
            route = route.verbs(verbs);
        }

        let runtime = registered.and_then(|c| c.routes.iter().find(|r| r.member == member_name));
        if let Some(runtime) = runtime {
            route.handler = runtime.handler.clone();
            route.validate_body = runtime.validate_body.clone();
            route.validate_params = runtime.validate_params.clone();
            route.validate_query = runtime.validate_query.clone();
        }

        let mut descriptor = controller.describe_route(&route, &self.config);
        let mut scope = function.type_parameter_names();
        scope.extend(class_params.iter().cloned());
        descriptor.request_types =
            self.request_types(&controller.name, member_name, function, &scope, resolver);
        Some(descriptor)
    }

    fn request_types<'p>(
        &self,
        controller: &str,
        member: &str,
        function: SourceNode<'p>,
        scope: &[String],
        resolver: &mut TypeResolver<'p>,
    ) -> Option<RouteTypes> {
        let params = parameters(function);
        let [param] = params.as_slice() else {
            resolver.record(BuildError::wrong_parameter_count(controller, member, params.len()));
            return None;
        };
        let Some(annotated) = param
            .field("type")
            .and_then(|annotation| annotation.children().into_iter().next())
        else {
            resolver.record(BuildError::unknown_request_type(controller, member, "any"));
            return None;
        };

        let (name, arg_nodes) = match annotated.kind() {
            "generic_type" => (
                annotated.field_text("name").unwrap_or_default(),
                annotated
                    .children()
                    .into_iter()
                    .find(|c| c.kind() == "type_arguments")
                    .map(|a| a.children())
                    .unwrap_or_default(),
            ),
            _ => (annotated.text(), Vec::new()),
        };
        let Some(shape) = self.config.request_shape(name) else {
            resolver.record(BuildError::unknown_request_type(controller, member, name));
            return None;
        };
        if arg_nodes.len() != shape.arity() {
            resolver.record(BuildError::request_type_arity(
                controller,
                member,
                name,
                shape.arity(),
                arg_nodes.len(),
            ));
            return None;
        }

        let resolved: Vec<ApiType> = arg_nodes
            .into_iter()
            .map(|node| resolver.resolve_in(node, scope))
            .collect();
        let mut slots = resolved.into_iter();
        let mut next = || slots.next().unwrap_or_default();
        let request = match shape {
            RequestShape::Typed => next(),
            RequestShape::Void => ApiType::void(),
        };
        Some(RouteTypes {
            request,
            response: next(),
            params: next(),
            query_string: next(),
        })
    }
}

/// The function node implementing a route member: the method itself, or the
/// arrow / function expression a property is initialised with.
fn handler_function(member: SourceNode<'_>) -> Option<SourceNode<'_>> {
    match member.kind() {
        "method_definition" => Some(member),
        _ => member
            .field("value")
            .filter(|v| matches!(v.kind(), "arrow_function" | "function_expression" | "function")),
    }
}

/// `middleware("key", ...params)` names one middleware with bound params.
/// Any other argument form is read as a list of references.
fn route_middleware(decorator: &Decorator<'_>) -> Vec<MiddlewareRef> {
    match decorator.string_arg(0) {
        Some(key) => {
            let params = decorator.args[1..]
                .iter()
                .map(|arg| literal(*arg).unwrap_or(Value::Null))
                .collect();
            vec![MiddlewareRef::provider(key, params)]
        }
        None => decorator
            .args
            .iter()
            .flat_map(|arg| middleware_refs(*arg))
            .collect(),
    }
}

fn parameters(function: SourceNode<'_>) -> Vec<SourceNode<'_>> {
    if let Some(single) = function.field("parameter") {
        return vec![single];
    }
    function
        .field("parameters")
        .map(|p| {
            p.children()
                .into_iter()
                .filter(|c| c.kind() != "this")
                .collect()
        })
        .unwrap_or_default()
}

impl MetadataCompiler for SourceCodeCompiler<'_> {
    fn compile(&mut self, middleware: &MiddlewareRegistry) -> Api {
        debug!("Static compile started ({} files)", self.program.files().len());
        let mut resolver = TypeResolver::new(&self.program, &self.config);
        let controllers: Vec<ControllerDescriptor> = self
            .program
            .find_all(&CLASS_KINDS)
            .into_iter()
            .filter_map(|class| self.compile_class(class, &mut resolver))
            .collect();

        let (reference_types, resolver_errors) = resolver.into_parts();
        let mut errors = self.load_errors.clone();
        errors.extend(resolver_errors);

        let mut api = ApiBuilder::new(middleware).build_with_errors(controllers, errors);
        api.reference_types = Some(reference_types);
        debug!(
            "Static compile completed: {} controllers, {} reference types, {} errors",
            api.controllers.len(),
            api.reference_types_slice().len(),
            api.errors.len()
        );
        api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{MiddlewareHandler, MiddlewareProvider};
    use crate::model::{ApiRequest, HandlerResult};
    use crate::types::TypeKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SOURCE: &str = r#"
interface IApiRequest<TBody, TResponse, TParams, TQuery> { body: TBody; }
interface IApiVoidRequest<TResponse, TParams, TQuery> { params: TParams; }
interface IUser { id: string; name: string; }
interface IIdParams { id: string; }

@api.controller("users", "/users", ["auth"])
export class UsersController {
    @api.route(":id")
    @api.middleware("audit")
    @api.middleware("limit", 10)
    get(req: IApiVoidRequest<IUser, IIdParams, void>) {}

    @api.route()
    @api.acceptVerbs("post", "bogus")
    @api.contentType("text/plain")
    create = async (req: IApiRequest<IUser, IUser, void, void>) => {};

    @api.route("broken")
    broken(a: IApiVoidRequest<IUser, void, void>, b: string) {}

    @api.route("odd")
    odd(req: IApiVoidRequest<IUser, void>) {}

    @api.route("plain")
    plain(req: Promise<IUser>) {}

    helper() {}
}

class Undecorated {
    @api.route()
    get(req: IApiVoidRequest<void, void, void>) {}
}

class Middlewares {
    @api.middlewareFunction("auth")
    static auth() {}

    @api.middlewareFunction("audit")
    static audit() {}

    @api.middlewareProviderFunction("limit", 1)
    static limit(n: number) {}
}
"#;

    fn compiler<'a>() -> SourceCodeCompiler<'a> {
        let program = SourceProgram::from_sources([("users.ts", SOURCE.to_string())]).unwrap();
        SourceCodeCompiler::from_program(program, CompilerConfig::default())
    }

    fn registry() -> MiddlewareRegistry {
        let mut registry = MiddlewareRegistry::new();
        registry
            .register_function("auth", MiddlewareHandler::passthrough())
            .register_function("audit", MiddlewareHandler::passthrough())
            .register_provider("limit", MiddlewareProvider::passthrough(), 1, 1);
        registry
    }

    #[test]
    fn test_middleware_declarations() {
        assert_eq!(
            compiler().middleware_declarations(),
            vec![
                MiddlewareDeclaration { key: "auth".into(), params: None },
                MiddlewareDeclaration { key: "audit".into(), params: None },
                MiddlewareDeclaration { key: "limit".into(), params: Some((1, 1)) },
            ]
        );
    }

    #[test]
    fn test_routes_from_decorators() {
        let api = compiler().compile(&registry());
        assert_eq!(api.controllers.len(), 1);
        let users = &api.controllers[0];
        assert_eq!(users.name, "users");
        let members: Vec<&str> = users.routes.iter().map(|r| r.member_name.as_str()).collect();
        assert_eq!(members, vec!["get", "create", "broken", "odd", "plain"]);

        let get = &users.routes[0];
        assert_eq!(get.path, "/users/:id");
        assert_eq!(get.verbs, vec![Verb::Get]);
        assert_eq!(
            get.middleware,
            vec![
                MiddlewareRef::key("auth"),
                MiddlewareRef::key("audit"),
                MiddlewareRef::provider("limit", vec![json!(10)]),
            ]
        );
        let types = get.request_types.as_ref().unwrap();
        assert_eq!(types.request, ApiType::void());
        assert_eq!(types.response, ApiType::named(TypeKind::InterfaceRef, "IUser"));
        assert_eq!(types.params, ApiType::named(TypeKind::InterfaceRef, "IIdParams"));
        assert_eq!(types.query_string, ApiType::void());

        let create = &users.routes[1];
        assert_eq!(create.path, "/users");
        assert_eq!(create.verbs, vec![Verb::Post]);
        assert_eq!(create.content_type, "text/plain");
        assert_eq!(
            create.request_types.as_ref().unwrap().request,
            ApiType::named(TypeKind::InterfaceRef, "IUser")
        );

        let names: Vec<&str> = api.reference_types_slice().iter().map(|t| t.name_str()).collect();
        assert_eq!(names, vec!["IUser", "IIdParams"]);
    }

    #[test]
    fn test_signature_errors() {
        let api = compiler().compile(&registry());
        assert_eq!(
            api.errors,
            vec![
                BuildError::wrong_parameter_count("users", "broken", 2),
                BuildError::request_type_arity("users", "odd", "IApiVoidRequest", 3, 2),
                BuildError::unknown_request_type("users", "plain", "Promise"),
            ]
        );
    }

    #[test]
    fn test_outermost_verbs_declaration_wins() {
        let source = r#"
@api.controller("orders", "/orders")
class OrdersController {
    @api.route()
    @api.acceptVerbs("put", "patch")
    @api.verbs("post")
    update(req: IApiVoidRequest<void, void, void>) {}

    @api.route("legacy")
    @api.acceptVerbs("bogus")
    @api.acceptVerbs("delete")
    remove(req: IApiVoidRequest<void, void, void>) {}
}
"#;
        let program = SourceProgram::from_sources([("orders.ts", source.to_string())]).unwrap();
        let api = SourceCodeCompiler::from_program(program, CompilerConfig::default())
            .compile(&MiddlewareRegistry::new());
        assert!(api.is_valid());
        let routes = &api.controllers[0].routes;
        assert_eq!(routes[0].verbs, vec![Verb::Put, Verb::Patch]);
        // no valid token in the declaration in effect: default verbs apply
        assert_eq!(routes[1].verbs, vec![Verb::Get]);
    }

    #[test]
    fn test_unregistered_middleware_reported() {
        let api = compiler().compile(&MiddlewareRegistry::new());
        assert!(api
            .error_messages()
            .contains(&"Missing middleware key 'auth'".to_string()));
        assert!(api
            .error_messages()
            .contains(&"Missing middleware provider with key 'limit'".to_string()));
    }

    #[derive(Default)]
    struct Users;

    fn handled(_: &mut Users, req: &mut ApiRequest) -> HandlerResult {
        req.send(200, json!("ok"));
        Ok(())
    }

    #[test]
    fn test_runtime_registrations_attached() {
        let mut controllers = ControllerRegistry::new();
        controllers.register(
            ControllerRegistration::of::<Users>("users")
                .route(RouteRegistration::new("get").handle(handled))
                .route(RouteRegistration::new("remove").handle(handled)),
        );
        let api = compiler()
            .with_controllers(&controllers)
            .compile(&registry());

        let users = &api.controllers[0];
        assert!(users.factory.is_some());
        assert!(users.routes[0].handler.is_some());
        assert!(users.routes[1].handler.is_none());
        assert!(api.errors.contains(&BuildError::MissingSourceNode {
            controller: "users".into(),
            member: "remove".into(),
        }));
    }

    #[test]
    fn test_compile_is_repeatable() {
        let mut compiler = compiler();
        let first = compiler.compile(&registry());
        let second = compiler.compile(&registry());
        assert_eq!(first.errors, second.errors);
        assert_eq!(first.reference_types, second.reference_types);
    }
}
