#![deny(missing_docs)]

//! # Type Rendering
//!
//! Renders resolved types back into TypeScript text for client generation.

use super::{ApiMember, ApiType, TypeKind};
use serde_json::Value;

/// Renders a type as a TypeScript type expression.
///
/// e.g. `ICurrentAndHistory<ILocation>[]`, `(ISimple | IComplex)[]`
pub fn render_type(ty: &ApiType) -> String {
    let (text, composite) = match ty.kind {
        TypeKind::Union => (join_sub_types(ty, " | "), true),
        TypeKind::Intersection => (join_sub_types(ty, " & "), true),
        TypeKind::Anonymous => (render_members(ty.members_slice(), " "), false),
        TypeKind::Unknown if ty.name.is_none() => ("any".to_string(), false),
        _ => (format!("{}{}", ty.name_str(), render_args(ty.args_slice())), false),
    };
    match (ty.is_array, composite) {
        (true, true) => format!("({})[]", text),
        (true, false) => format!("{}[]", text),
        _ => text,
    }
}

/// Renders an expanded interface or enum as a TypeScript declaration.
///
/// Returns `None` for kinds that have no declaration form.
pub fn render_declaration(ty: &ApiType) -> Option<String> {
    match ty.kind {
        TypeKind::Interface => {
            let extends = if ty.extends_slice().is_empty() {
                String::new()
            } else {
                let bases: Vec<String> = ty.extends_slice().iter().map(render_type).collect();
                format!(" extends {}", bases.join(", "))
            };
            Some(format!(
                "export interface {}{}{} {}",
                ty.name_str(),
                render_args(ty.args_slice()),
                extends,
                render_members(ty.members_slice(), "\n  ")
            ))
        }
        TypeKind::Enum => {
            let members: Vec<String> = ty
                .members_slice()
                .iter()
                .map(|m| format!("{} = {}", property_key(&m.name), m.value.unwrap_or_default()))
                .collect();
            Some(format!(
                "export enum {} {{ {} }}",
                ty.name_str(),
                members.join(", ")
            ))
        }
        _ => None,
    }
}

fn join_sub_types(ty: &ApiType, separator: &str) -> String {
    let parts: Vec<String> = ty.sub_types_slice().iter().map(render_type).collect();
    parts.join(separator)
}

fn render_args(args: &[ApiType]) -> String {
    if args.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = args.iter().map(render_type).collect();
    format!("<{}>", parts.join(", "))
}

/// Member names that are not identifiers are written as string literals.
fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        name.to_string()
    } else {
        Value::String(name.to_string()).to_string()
    }
}

fn render_members(members: &[ApiMember], separator: &str) -> String {
    if members.is_empty() {
        return "{}".to_string();
    }
    let fields: Vec<String> = members
        .iter()
        .map(|m| {
            let ty = m.ty.as_ref().map(render_type).unwrap_or_else(|| "any".into());
            format!("{}{}: {};", property_key(&m.name), if m.optional { "?" } else { "" }, ty)
        })
        .collect();
    let closing = if separator == " " { " " } else { "\n" };
    format!("{{{}{}{}}}", separator, fields.join(separator), closing)
}
