#![deny(missing_docs)]

//! # Generic Substitution
//!
//! Clones an expanded reference type for a specific use site and rewrites its
//! type parameters to the concrete arguments given there.

use super::{find_reference, ApiType, TypeKind};
use tracing::warn;

/// Expands a reference kind into a clone of its reference-type entry,
/// specialised with the reference's own generic arguments.
///
/// Returns `None` when the type is not a reference or its entry is missing.
pub fn create_type_from_reference(ty: &ApiType, reference_types: &[ApiType]) -> Option<ApiType> {
    find_reference(ty, reference_types).map(|reference| clone_type(ty, reference))
}

/// Clones `reference` for the use site `ty`.
///
/// The clone takes the use site's array flag and arguments. Type parameters
/// inside the clone are replaced positionally by those arguments.
pub fn clone_type(ty: &ApiType, reference: &ApiType) -> ApiType {
    let mut clone = reference.clone();
    clone.is_array = ty.is_array;
    if let Some(args) = &ty.args {
        clone.args = Some(args.clone());
        replace_generic_types(&mut clone, reference.args_slice(), args);
    }
    clone
}

/// Rewrites every `TypeParam` below `clone` whose name matches a declared
/// parameter in `reference_args` to the argument at the same position in
/// `replace_args`.
///
/// The root's own `args` are not visited: they already hold the use-site values.
pub fn replace_generic_types(
    clone: &mut ApiType,
    reference_args: &[ApiType],
    replace_args: &[ApiType],
) {
    let mut substitute = substitution(reference_args, replace_args);
    for child in children_mut(clone, false) {
        substitute_below(child, &mut substitute);
    }
}

/// Like [`replace_generic_types`], but includes `ty` itself and its args.
///
/// Used for generic type aliases, whose resolved body may itself be a
/// parameter (`type Id<T> = T`) or carry parameters in its args.
pub fn substitute_type_params(ty: &mut ApiType, reference_args: &[ApiType], replace_args: &[ApiType]) {
    let mut substitute = substitution(reference_args, replace_args);
    substitute_below(ty, &mut substitute);
}

fn substitution<'a>(
    reference_args: &'a [ApiType],
    replace_args: &'a [ApiType],
) -> impl FnMut(&mut ApiType) + 'a {
    move |param: &mut ApiType| {
        let position = reference_args
            .iter()
            .position(|a| a.name == param.name && param.name.is_some());
        let Some(replacement) = position.and_then(|idx| replace_args.get(idx)) else {
            warn!(
                "Cannot find generic argument for type parameter '{}'",
                param.name_str()
            );
            return;
        };
        if param.is_array && replacement.is_array {
            warn!(
                "Nested array for type parameter '{}' flattened to one level",
                param.name_str()
            );
        }
        param.is_array |= replacement.is_array;
        param.name = replacement.name.clone();
        param.kind = replacement.kind;
        param.args = replacement.args.clone();
        param.sub_types = replacement.sub_types.clone();
        param.members = replacement.members.clone();
        param.extends = replacement.extends.clone();
    }
}

fn substitute_below(ty: &mut ApiType, substitute: &mut impl FnMut(&mut ApiType)) {
    if ty.kind == TypeKind::TypeParam {
        substitute(ty);
        return;
    }
    for child in children_mut(ty, true) {
        substitute_below(child, substitute);
    }
}

fn children_mut(ty: &mut ApiType, with_args: bool) -> Vec<&mut ApiType> {
    let skip_members = ty.kind == TypeKind::Enum;
    let mut out: Vec<&mut ApiType> = Vec::new();
    if let Some(extends) = ty.extends.as_mut() {
        out.extend(extends.iter_mut());
    }
    if let Some(sub_types) = ty.sub_types.as_mut() {
        out.extend(sub_types.iter_mut());
    }
    if with_args {
        if let Some(args) = ty.args.as_mut() {
            out.extend(args.iter_mut());
        }
    }
    if !skip_members {
        if let Some(members) = ty.members.as_mut() {
            out.extend(members.iter_mut().filter_map(|m| m.ty.as_mut()));
        }
    }
    out
}
