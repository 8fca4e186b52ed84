use pretty_assertions::assert_eq;
use routemeta_core::middleware::{Flow, MiddlewareHandler, MiddlewareProvider};
use routemeta_core::model::{ApiRequest, HandlerResult};
use routemeta_core::{
    BuildError, CompilerConfig, ControllerRegistration, ControllerRegistry, MetadataCompiler,
    MiddlewareRef, MiddlewareRegistry, RouteBuilder, RouteRegistration, RouteTable,
    RuntimeCompiler, SourceCodeCompiler, Verb,
};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Default)]
struct Simple;

impl Simple {
    fn get(&mut self, req: &mut ApiRequest) -> HandlerResult {
        req.send(200, json!({ "id": req.params["id"] }));
        Ok(())
    }

    fn get_all(&mut self, req: &mut ApiRequest) -> HandlerResult {
        req.send(200, json!([]));
        Ok(())
    }
}

fn simple(name: &str, prefix: &str) -> ControllerRegistration {
    ControllerRegistration::of::<Simple>(name)
        .prefix(prefix)
        .route(RouteRegistration::new("get").path(":id").handle(Simple::get))
        .route(RouteRegistration::new("getAll").handle(Simple::get_all))
}

fn one_only() -> MiddlewareRegistry {
    let mut registry = MiddlewareRegistry::new();
    registry.register_function("one", MiddlewareHandler::passthrough());
    registry
}

#[test]
fn test_missing_key_reported_once() {
    let mut controllers = ControllerRegistry::new();
    controllers.register(
        simple("simple", "/simple")
            .middleware([MiddlewareRef::key("one"), MiddlewareRef::key("missing-key")]),
    );
    let api = RuntimeCompiler::new(&controllers).compile(&one_only());

    assert_eq!(api.errors, vec![BuildError::MissingMiddleware("missing-key".to_string())]);
    assert_eq!(api.controllers[0].routes.len(), 2);
    assert_eq!(
        api.find_route("simple_getAll").unwrap().middleware,
        vec![MiddlewareRef::key("one"), MiddlewareRef::key("missing-key")]
    );
}

#[test]
fn test_duplicate_routes() {
    let mut controllers = ControllerRegistry::new();
    controllers
        .register(simple("simple", "/simple"))
        .register(simple("simpleClash", "simple"));
    let api = RuntimeCompiler::new(&controllers).compile(&one_only());

    assert_eq!(
        api.error_messages(),
        vec![
            "Duplicate route (get: /simple/:id) found for simple.get,simpleClash.get".to_string(),
            "Duplicate route (get: /simple) found for simple.getAll,simpleClash.getAll".to_string(),
        ]
    );
}

#[test]
fn test_empty_controllers_dropped() {
    let mut controllers = ControllerRegistry::new();
    controllers
        .register(ControllerRegistration::of::<Simple>("empty").prefix("/empty"))
        .register(
            ControllerRegistration::of::<Simple>("unbound")
                .route(RouteRegistration::new("get").path("nothing")),
        )
        .register(simple("simple", "/simple"));
    let api = RuntimeCompiler::new(&controllers).compile(&MiddlewareRegistry::new());

    assert!(api.is_valid());
    let names: Vec<&str> = api.controllers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["simple"]);
    assert_eq!(api.reference_types, None);
}

#[test]
fn test_compile_then_bind() {
    let mut registry = MiddlewareRegistry::new();
    registry
        .register_function(
            "tag",
            MiddlewareHandler::new(|req: &mut ApiRequest| {
                req.query = json!({ "tagged": true });
                Ok(Flow::Next)
            }),
        )
        .register_provider(
            "maxId",
            MiddlewareProvider::new(|params: &[Value]| {
                let max = params.first().and_then(Value::as_i64).unwrap_or_default();
                MiddlewareHandler::new(move |req: &mut ApiRequest| {
                    let id = req.params["id"].as_str().and_then(|id| id.parse::<i64>().ok());
                    if id.is_some_and(|id| id > max) {
                        req.send(404, Value::Null);
                        return Ok(Flow::Halt);
                    }
                    Ok(Flow::Next)
                })
            }),
            1,
            1,
        );

    let mut controllers = ControllerRegistry::new();
    controllers.register(
        ControllerRegistration::of::<Simple>("simple")
            .prefix("/simple")
            .middleware([MiddlewareRef::key("tag")])
            .route(
                RouteRegistration::new("get")
                    .path(":id")
                    .middleware([MiddlewareRef::provider("maxId", vec![json!(10)])])
                    .handle(Simple::get),
            ),
    );
    let api = RuntimeCompiler::new(&controllers).compile(&registry);
    assert!(api.is_valid());

    let mut table = RouteTable::new();
    let bound = RouteBuilder::new(&registry).build(&api, &mut table).unwrap();
    assert_eq!(bound, 1);
    assert_eq!(table.get(Verb::Get, "/simple/:id").unwrap().middleware_len(), 2);

    let mut req = ApiRequest::new(Value::Null, json!({ "id": "7" }), Value::Null);
    table.dispatch(Verb::Get, "/simple/:id", &mut req).unwrap();
    assert_eq!(req.status, Some(200));
    assert_eq!(req.query, json!({ "tagged": true }));

    let mut req = ApiRequest::new(Value::Null, json!({ "id": "11" }), Value::Null);
    table.dispatch(Verb::Get, "/simple/:id", &mut req).unwrap();
    assert_eq!(req.status, Some(404));
}

#[test]
fn test_source_routes_bound_to_runtime_handlers() {
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
    let paths = vec![
        fixtures.join("dto-definitions.d.ts"),
        fixtures.join("middleware.ts"),
        fixtures.join("controllers.ts"),
    ];

    let mut controllers = ControllerRegistry::new();
    controllers.register(simple("simple", "/simple"));

    let mut compiler = SourceCodeCompiler::load(&paths[..], CompilerConfig::default())
        .unwrap()
        .with_controllers(&controllers);
    let registry = MiddlewareRegistry::from_declarations(&compiler.middleware_declarations());
    let api = compiler.compile(&registry);
    assert!(api.is_valid());

    let get = api.find_route("simple_get").unwrap();
    assert!(get.handler.is_some());
    assert!(get.request_types.is_some());
    assert!(api.find_route("middleware_get").unwrap().handler.is_none());

    let mut table = RouteTable::new();
    let bound = RouteBuilder::new(&registry).build(&api, &mut table).unwrap();
    // get and getAll of `simple`, each accepting get and options
    assert_eq!(bound, 4);

    let mut req = ApiRequest::new(Value::Null, json!({ "id": "3" }), Value::Null);
    table.dispatch(Verb::Options, "/simple/:id", &mut req).unwrap();
    assert_eq!(req.response, Some(json!({ "id": "3" })));
}
