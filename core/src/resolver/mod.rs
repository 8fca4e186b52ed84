#![deny(missing_docs)]

//! # Type Resolver
//!
//! Resolves type syntax into [`ApiType`] graphs.
//!
//! Call sites receive lightweight `InterfaceRef` / `EnumRef` placeholders. The
//! first time a declaration is reached it is expanded into a full `Interface`
//! or `Enum` entry in the reference-type collection; the visited-symbol set
//! guarantees each declaration is expanded at most once, which is also what
//! makes cyclic interfaces terminate.
//!
//! A resolver is scoped to one compile run. Build a fresh one per run.

use crate::config::CompilerConfig;
use crate::error::BuildError;
use crate::source::decorators::literal;
use crate::source::{DeclKind, DeclarationTable, SourceNode, SourceProgram, SymbolId};
use crate::types::{substitute_type_params, ApiMember, ApiType, TypeKind, SIMPLE_TYPES};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{error, trace, warn};

static ORDINAL_RE: OnceLock<Regex> = OnceLock::new();

/// Type resolution state for one compile run.
#[derive(Debug)]
pub struct TypeResolver<'p> {
    declarations: DeclarationTable<'p>,
    config: CompilerConfig,
    reference_types: IndexMap<String, ApiType>,
    visited: HashSet<SymbolId>,
    failed: HashSet<String>,
    alias_stack: Vec<SymbolId>,
    errors: Vec<BuildError>,
}

impl<'p> TypeResolver<'p> {
    /// Creates a resolver over every declaration in `program`.
    pub fn new(program: &'p SourceProgram, config: &CompilerConfig) -> Self {
        Self {
            declarations: DeclarationTable::build(program),
            config: config.clone(),
            reference_types: IndexMap::new(),
            visited: HashSet::new(),
            failed: HashSet::new(),
            alias_stack: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Resolves a type node with no type parameters in scope.
    pub fn resolve(&mut self, node: SourceNode<'p>) -> ApiType {
        self.resolve_in(node, &[])
    }

    /// Resolves a named reference, as if written `name` in a type position.
    pub fn resolve_name(&mut self, name: &str) -> ApiType {
        self.reference(name, Vec::new(), &[])
    }

    /// Resolves a type node. Names in `scope` are type parameters and
    /// resolve to `TypeParam` placeholders.
    pub fn resolve_in(&mut self, node: SourceNode<'p>, scope: &[String]) -> ApiType {
        match node.kind() {
            "type_annotation" | "parenthesized_type" => match node.children().into_iter().next() {
                Some(inner) => self.resolve_in(inner, scope),
                None => self.unsupported(node),
            },
            "predefined_type" => {
                let name = node.text();
                if SIMPLE_TYPES.contains(&name) {
                    ApiType::simple(name)
                } else {
                    self.unsupported(node)
                }
            }
            "array_type" => match node.children().into_iter().next() {
                Some(element) => {
                    let element = self.resolve_in(element, scope);
                    array_of(element)
                }
                None => self.unsupported(node),
            },
            "union_type" | "intersection_type" => {
                let mut sub_types = Vec::new();
                self.flatten(node, node.kind(), scope, &mut sub_types);
                ApiType::composite(node.kind() == "union_type", sub_types)
            }
            "object_type" => ApiType::anonymous(self.members(node, "{anonymous}", scope)),
            "type_identifier" => self.reference(node.text(), Vec::new(), scope),
            "nested_type_identifier" => {
                let name = node.field_text("name").unwrap_or(node.text());
                self.reference(name, Vec::new(), scope)
            }
            "generic_type" => {
                let Some(name_node) = node.field("name") else {
                    return self.unsupported(node);
                };
                let name = match name_node.kind() {
                    "nested_type_identifier" => name_node.field_text("name").unwrap_or(name_node.text()),
                    _ => name_node.text(),
                };
                let arg_nodes = node
                    .children()
                    .into_iter()
                    .find(|c| c.kind() == "type_arguments")
                    .map(|a| a.children())
                    .unwrap_or_default();
                let args = arg_nodes
                    .into_iter()
                    .map(|a| self.resolve_in(a, scope))
                    .collect();
                self.reference(name, args, scope)
            }
            _ => self.unsupported(node),
        }
    }

    /// Expanded reference types, in first-reached order.
    pub fn reference_types(&self) -> impl Iterator<Item = &ApiType> {
        self.reference_types.values()
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[BuildError] {
        &self.errors
    }

    /// Records an error found by the caller while resolving.
    pub fn record(&mut self, err: BuildError) {
        error!("{}", err);
        self.errors.push(err);
    }

    /// Consumes the resolver, returning the reference types and errors.
    pub fn into_parts(self) -> (Vec<ApiType>, Vec<BuildError>) {
        (self.reference_types.into_values().collect(), self.errors)
    }

    fn unsupported(&mut self, node: SourceNode<'p>) -> ApiType {
        self.record(BuildError::UnsupportedSyntax(format!(
            "{} ({})",
            node.kind(),
            node.location()
        )));
        ApiType::default()
    }

    fn record_once(&mut self, name: &str, err: BuildError) {
        if self.failed.insert(name.to_string()) {
            self.record(err);
        }
    }

    fn flatten(
        &mut self,
        node: SourceNode<'p>,
        kind: &str,
        scope: &[String],
        out: &mut Vec<ApiType>,
    ) {
        for child in node.children() {
            if child.kind() == kind {
                self.flatten(child, kind, scope, out);
            } else {
                out.push(self.resolve_in(child, scope));
            }
        }
    }

    fn reference(&mut self, name: &str, mut args: Vec<ApiType>, scope: &[String]) -> ApiType {
        if name == "Array" && args.len() == 1 {
            return array_of(args.remove(0));
        }
        if scope.iter().any(|s| s == name) {
            return with_args(ApiType::named(TypeKind::TypeParam, name), args);
        }
        // Request markers are unpacked by the compiler, never expanded.
        if self.config.request_shape(name).is_some() {
            return with_args(ApiType::named(TypeKind::Unknown, name), args);
        }

        let found: Vec<_> = self.declarations.lookup(name).to_vec();
        let resolved = match found.as_slice() {
            [] => {
                self.record_once(name, BuildError::UnresolvedType(name.to_string()));
                ApiType::named(TypeKind::Unknown, name)
            }
            [decl] => match decl.kind {
                DeclKind::Interface => {
                    self.expand_interface(decl.node, name);
                    ApiType::named(TypeKind::InterfaceRef, name)
                }
                DeclKind::Enum => {
                    self.expand_enum(decl.node, name);
                    ApiType::named(TypeKind::EnumRef, name)
                }
                DeclKind::TypeAlias => return self.resolve_alias(decl.node, name, args),
                DeclKind::Class => {
                    self.record_once(
                        name,
                        BuildError::UnsupportedTypeReference {
                            kind: decl.kind.to_string(),
                            name: name.to_string(),
                        },
                    );
                    ApiType::named(TypeKind::Unknown, name)
                }
            },
            _ => {
                self.record_once(name, BuildError::MultipleDeclarations(name.to_string()));
                ApiType::named(TypeKind::Unknown, name)
            }
        };
        with_args(resolved, args)
    }

    fn resolve_alias(&mut self, node: SourceNode<'p>, name: &str, args: Vec<ApiType>) -> ApiType {
        let id = node.id();
        if self.alias_stack.contains(&id) {
            warn!("Recursive type alias '{}' at {} left unresolved", name, node.location());
            return ApiType::named(TypeKind::Unknown, name);
        }
        let Some(value) = node.field("value") else {
            return self.unsupported(node);
        };

        let params = node.type_parameter_names();
        self.alias_stack.push(id);
        let mut resolved = self.resolve_in(value, &params);
        self.alias_stack.pop();

        if !params.is_empty() {
            let declared: Vec<ApiType> = params
                .iter()
                .map(|p| ApiType::named(TypeKind::TypeArg, p))
                .collect();
            substitute_type_params(&mut resolved, &declared, &args);
        } else if resolved.args.is_none() {
            resolved = with_args(resolved, args);
        }

        // Simple and reference kinds are identified by their name.
        if matches!(
            resolved.kind,
            TypeKind::Union | TypeKind::Intersection | TypeKind::Anonymous
        ) {
            resolved.name = Some(name.to_string());
        }
        resolved
    }

    fn expand_interface(&mut self, node: SourceNode<'p>, name: &str) {
        if !self.visited.insert(node.id()) {
            return;
        }
        // Reserve the slot so the interface precedes what it references.
        self.reference_types
            .insert(name.to_string(), ApiType::named(TypeKind::Interface, name));

        let params = node.type_parameter_names();
        let mut expanded = ApiType::named(TypeKind::Interface, name);
        if !params.is_empty() {
            expanded.args = Some(
                params
                    .iter()
                    .map(|p| ApiType::named(TypeKind::TypeArg, p))
                    .collect(),
            );
        }
        if let Some(body) = node.field("body") {
            expanded.members = Some(self.members(body, name, &params));
        }

        let bases: Vec<SourceNode<'p>> = node
            .children()
            .into_iter()
            .filter(|c| c.kind() == "extends_type_clause")
            .flat_map(|c| c.fields("type"))
            .collect();
        let mut extends = Vec::new();
        for base in bases {
            let resolved = self.resolve_in(base, &params);
            if resolved.kind == TypeKind::InterfaceRef {
                extends.push(resolved);
            } else {
                warn!(
                    "Ignoring base type '{}' of interface {}: not an interface",
                    base.text(),
                    name
                );
            }
        }
        if !extends.is_empty() {
            expanded.extends = Some(extends);
        }

        self.reference_types.insert(name.to_string(), expanded);
    }

    fn expand_enum(&mut self, node: SourceNode<'p>, name: &str) {
        if !self.visited.insert(node.id()) {
            return;
        }
        let mut members = Vec::new();
        let mut ordinal: i64 = -1;
        let items = node.field("body").map(|b| b.children()).unwrap_or_default();
        for item in items {
            let (member, initializer) = match item.kind() {
                "enum_assignment" => (item.field("name"), item.field("value")),
                _ => (Some(item), None),
            };
            let Some(member) = member else {
                continue;
            };
            let member_name = property_name(member);
            let explicit = initializer.and_then(|value| {
                let parsed = parse_ordinal(value.text());
                if parsed.is_none() {
                    warn!(
                        "Enum member {}.{} has a non-numeric initializer '{}'",
                        name,
                        member_name,
                        value.text()
                    );
                }
                parsed
            });
            let Some(next) = explicit.or_else(|| ordinal.checked_add(1)) else {
                warn!(
                    "Enum {} overflows at member {}; remaining members ignored",
                    name, member_name
                );
                break;
            };
            ordinal = next;
            members.push(ApiMember::ordinal(member_name, ordinal));
        }

        let mut expanded = ApiType::named(TypeKind::Enum, name);
        expanded.members = Some(members);
        self.reference_types.insert(name.to_string(), expanded);
    }

    fn members(&mut self, body: SourceNode<'p>, owner: &str, scope: &[String]) -> Vec<ApiMember> {
        let mut members = Vec::new();
        for item in body.children() {
            let member = item.field("name").map(property_name).unwrap_or_default();
            match item.kind() {
                "property_signature" => {
                    let optional = item.has_token("?");
                    let Some(annotation) = item.field("type") else {
                        members.push(ApiMember::field(member, ApiType::simple("any"), optional));
                        continue;
                    };
                    let is_function = annotation
                        .children()
                        .first()
                        .is_some_and(|t| t.kind() == "function_type");
                    if is_function {
                        trace!("Ignoring Function type: {} - {}", owner, member);
                        continue;
                    }
                    let ty = self.resolve_in(annotation, scope);
                    members.push(ApiMember::field(member, ty, optional));
                }
                "method_signature" => trace!("Ignoring Method Signature: {} - {}", owner, member),
                kind => self.record(BuildError::UnsupportedMember {
                    kind: kind.to_string(),
                    owner: owner.to_string(),
                    member: if member.is_empty() {
                        item.text().to_string()
                    } else {
                        member
                    },
                }),
            }
        }
        members
    }
}

fn array_of(element: ApiType) -> ApiType {
    if element.is_array {
        warn!(
            "Nested array of '{}' flattened to one level",
            element.name_str()
        );
    }
    element.into_array()
}

fn with_args(mut ty: ApiType, args: Vec<ApiType>) -> ApiType {
    if !args.is_empty() {
        ty.args = Some(args);
    }
    ty
}

fn property_name(node: SourceNode<'_>) -> String {
    match literal(node) {
        Some(Value::String(s)) if node.kind() == "string" => s,
        _ => node.text().to_string(),
    }
}

/// Parses an integer enum initializer: decimal or hex, optionally signed.
fn parse_ordinal(text: &str) -> Option<i64> {
    let re = ORDINAL_RE.get_or_init(|| {
        Regex::new(r"^\s*([+-]?)\s*(0[xX][0-9a-fA-F]+|\d+)\s*$").expect("Invalid regex")
    });
    let caps = re.captures(text)?;
    let digits = caps.get(2)?.as_str();
    let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    match caps.get(1).map(|m| m.as_str()) {
        Some("-") => Some(-value),
        _ => Some(value),
    }
}
