#![deny(missing_docs)]

//! # Api Explorer
//!
//! Read-only traversals over compiled controllers and resolved types.

use crate::model::{ControllerDescriptor, MiddlewareRef, RouteDescriptor};
use crate::types::{ApiType, TypeKind};

/// Calls `action` for every route of every controller, in order.
pub fn for_each_route<'a>(
    controllers: &'a [ControllerDescriptor],
    mut action: impl FnMut(&'a ControllerDescriptor, &'a RouteDescriptor),
) {
    for controller in controllers {
        for route in &controller.routes {
            action(controller, route);
        }
    }
}

/// Routes carrying no resolved request types.
pub fn gather_untyped_routes(controllers: &[ControllerDescriptor]) -> Vec<&RouteDescriptor> {
    let mut routes = Vec::new();
    for_each_route(controllers, |_, r| {
        if r.request_types.is_none() {
            routes.push(r);
        }
    });
    routes
}

/// The four request slots of every typed route, in route order.
pub fn gather_route_types(controllers: &[ControllerDescriptor]) -> Vec<&ApiType> {
    let mut types = Vec::new();
    for_each_route(controllers, |_, r| {
        if let Some(rt) = &r.request_types {
            types.extend(rt.all());
        }
    });
    types
}

/// Every type reachable from `types`, pre-order through extends, sub types,
/// args and members. Enum members are not types and are skipped.
pub fn gather_types<'a>(types: impl IntoIterator<Item = &'a ApiType>) -> Vec<&'a ApiType> {
    let mut items = Vec::new();
    for ty in types {
        collect(ty, &mut items);
    }
    items
}

fn collect<'a>(ty: &'a ApiType, out: &mut Vec<&'a ApiType>) {
    out.push(ty);
    for base in ty.extends_slice() {
        collect(base, out);
    }
    for sub in ty.sub_types_slice() {
        collect(sub, out);
    }
    for arg in ty.args_slice() {
        collect(arg, out);
    }
    if ty.kind != TypeKind::Enum {
        for member in ty.members_slice() {
            if let Some(member_ty) = &member.ty {
                collect(member_ty, out);
            }
        }
    }
}

/// Distinct middleware references over all routes, first-seen order.
pub fn all_middleware_refs(controllers: &[ControllerDescriptor]) -> Vec<&MiddlewareRef> {
    let mut refs: Vec<&MiddlewareRef> = Vec::new();
    for_each_route(controllers, |_, r| {
        for reference in &r.middleware {
            if !refs.contains(&reference) {
                refs.push(reference);
            }
        }
    });
    refs
}
