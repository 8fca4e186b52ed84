#![deny(missing_docs)]

//! # Api Types
//!
//! The normalized structural description of request/response contract types,
//! as produced by the type extraction engine.
//!
//! Reference kinds (`InterfaceRef`, `EnumRef`) are lightweight placeholders used
//! at call sites. The expanded `Interface` / `Enum` entries live once in the
//! reference-type collection attached to the `Api`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic substitution over resolved types.
pub mod generics;

/// TypeScript rendering of types and declarations.
pub mod render;

/// Representative value materialization.
pub mod values;

pub use generics::{
    clone_type, create_type_from_reference, replace_generic_types, substitute_type_params,
};
pub use render::{render_declaration, render_type};
pub use values::make_type_value;

/// Names of the primitive keyword types.
pub const SIMPLE_TYPES: [&str; 5] = ["any", "string", "boolean", "number", "void"];

/// The kind tag of an [`ApiType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TypeKind {
    /// A primitive keyword type (`any`, `string`, `boolean`, `number`, `void`).
    Simple,
    /// Call-site reference to an interface.
    InterfaceRef,
    /// Call-site reference to an enum.
    EnumRef,
    /// Fully expanded interface, held in the reference-type collection.
    Interface,
    /// Fully expanded enum, held in the reference-type collection.
    Enum,
    /// `A | B`.
    Union,
    /// `A & B`.
    Intersection,
    /// Inline object type literal.
    Anonymous,
    /// Type parameter declared by an interface (`interface I<T>`).
    TypeArg,
    /// Type parameter used inside a generic body.
    TypeParam,
    /// Could not be resolved.
    #[default]
    Unknown,
}

impl TypeKind {
    /// True for the call-site placeholder kinds.
    pub fn is_ref(self) -> bool {
        matches!(self, TypeKind::InterfaceRef | TypeKind::EnumRef)
    }

    /// The expanded kind a reference kind points at.
    pub fn expanded(self) -> Option<TypeKind> {
        match self {
            TypeKind::InterfaceRef => Some(TypeKind::Interface),
            TypeKind::EnumRef => Some(TypeKind::Enum),
            _ => None,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A resolved structural type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiType {
    /// Type name; absent for unions, intersections and anonymous records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Kind tag.
    pub kind: TypeKind,
    /// One level of array wrapping.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_array: bool,
    /// Generic arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<ApiType>>,
    /// Base interface references (expanded kinds only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<Vec<ApiType>>,
    /// Union / intersection members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_types: Option<Vec<ApiType>>,
    /// Record fields, or enum members (expanded kinds and anonymous records only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<ApiMember>>,
}

/// A named member of an interface, anonymous record or enum.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiMember {
    /// Member name.
    pub name: String,
    /// Member type; absent for enum members.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<ApiType>,
    /// Declared with `?`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    /// Enum ordinal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

impl ApiMember {
    /// A record field.
    pub fn field(name: impl Into<String>, ty: ApiType, optional: bool) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            optional,
            value: None,
        }
    }

    /// An enum member with its ordinal.
    pub fn ordinal(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            ty: None,
            optional: false,
            value: Some(value),
        }
    }
}

impl ApiType {
    /// A named type of the given kind, with no structure.
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind,
            ..Default::default()
        }
    }

    /// A primitive keyword type.
    pub fn simple(name: impl Into<String>) -> Self {
        Self::named(TypeKind::Simple, name)
    }

    /// The `void` type, used as the body of void requests.
    pub fn void() -> Self {
        Self::simple("void")
    }

    /// Union (`union = true`) or intersection of the given members.
    pub fn composite(union: bool, sub_types: Vec<ApiType>) -> Self {
        Self {
            kind: if union {
                TypeKind::Union
            } else {
                TypeKind::Intersection
            },
            sub_types: Some(sub_types),
            ..Default::default()
        }
    }

    /// Inline object type.
    pub fn anonymous(members: Vec<ApiMember>) -> Self {
        Self {
            kind: TypeKind::Anonymous,
            members: Some(members),
            ..Default::default()
        }
    }

    /// Returns the type marked as an array.
    pub fn into_array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Name or the empty string.
    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Generic arguments as a slice.
    pub fn args_slice(&self) -> &[ApiType] {
        self.args.as_deref().unwrap_or_default()
    }

    /// Members as a slice.
    pub fn members_slice(&self) -> &[ApiMember] {
        self.members.as_deref().unwrap_or_default()
    }

    /// Sub types as a slice.
    pub fn sub_types_slice(&self) -> &[ApiType] {
        self.sub_types.as_deref().unwrap_or_default()
    }

    /// Base references as a slice.
    pub fn extends_slice(&self) -> &[ApiType] {
        self.extends.as_deref().unwrap_or_default()
    }
}

/// The four resolved slots of a route's request contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTypes {
    /// Request body.
    pub request: ApiType,
    /// Response body.
    pub response: ApiType,
    /// Path parameters.
    pub params: ApiType,
    /// Query string.
    pub query_string: ApiType,
}

impl RouteTypes {
    /// The slots in declaration order.
    pub fn all(&self) -> [&ApiType; 4] {
        [&self.request, &self.response, &self.params, &self.query_string]
    }
}

/// Finds the expanded entry a reference type points at.
pub fn find_reference<'a>(ty: &ApiType, reference_types: &'a [ApiType]) -> Option<&'a ApiType> {
    let expanded = ty.kind.expanded()?;
    reference_types
        .iter()
        .find(|rt| rt.kind == expanded && rt.name == ty.name)
}
