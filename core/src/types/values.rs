#![deny(missing_docs)]

//! # Value Materialization
//!
//! Produces a representative literal value for a resolved type. Used to build
//! sample payloads for tests and structural validation.

use super::{generics::create_type_from_reference, render_type, ApiMember, ApiType, TypeKind};
use serde_json::{Map, Value};

/// Nesting bound for one generic interface whose arguments keep changing.
const MAX_GENERIC_DEPTH: usize = 8;

/// References being expanded: (name, name with its substituted arguments).
type Expanding = Vec<(String, String)>;

/// Materializes a representative value for `ty`.
///
/// Reference kinds are dereferenced through `reference_types`. Unions and
/// intersections use their first sub type. A reference met again with the
/// same arguments while it is still being expanded yields `null` (or `[]` for
/// arrays); `IBox<IBox<string>>` expands both levels.
pub fn make_type_value(ty: &ApiType, reference_types: &[ApiType]) -> Value {
    let mut expanding = Vec::new();
    value_of(ty, reference_types, &mut expanding)
}

fn wrap(ty: &ApiType, value: Value) -> Value {
    if ty.is_array {
        Value::Array(vec![value])
    } else {
        value
    }
}

fn value_of(ty: &ApiType, refs: &[ApiType], expanding: &mut Expanding) -> Value {
    match ty.kind {
        TypeKind::Simple => match ty.name_str() {
            "any" => wrap(ty, Value::Object(Map::new())),
            "string" => wrap(ty, Value::from("value")),
            "boolean" => wrap(ty, Value::Bool(false)),
            "number" => wrap(ty, Value::from(1)),
            _ => Value::Null,
        },
        TypeKind::InterfaceRef | TypeKind::EnumRef => {
            let name = ty.name_str().to_string();
            let key = expansion_key(ty);
            let depth = expanding.iter().filter(|(n, _)| *n == name).count();
            if depth >= MAX_GENERIC_DEPTH || expanding.iter().any(|(_, k)| *k == key) {
                return if ty.is_array {
                    Value::Array(Vec::new())
                } else {
                    Value::Null
                };
            }
            let Some(expanded) = create_type_from_reference(ty, refs) else {
                return Value::Null;
            };
            expanding.push((name, key));
            let value = value_of(&expanded, refs, expanding);
            expanding.pop();
            value
        }
        TypeKind::Union | TypeKind::Intersection => match ty.sub_types_slice().first() {
            Some(first) => wrap(ty, value_of(first, refs, expanding)),
            None => Value::Null,
        },
        TypeKind::Anonymous => wrap(ty, object_of(ty.members_slice(), refs, expanding)),
        TypeKind::Interface => {
            let mut members = Vec::new();
            inherited_members(ty, refs, &mut members, &mut Vec::new());
            members.extend(ty.members_slice().iter().cloned());
            wrap(ty, object_of(&members, refs, expanding))
        }
        TypeKind::Enum => match ty.members_slice().first().and_then(|m| m.value) {
            Some(ordinal) => wrap(ty, Value::from(ordinal)),
            None => Value::Null,
        },
        TypeKind::TypeArg | TypeKind::TypeParam | TypeKind::Unknown => Value::Null,
    }
}

fn expansion_key(ty: &ApiType) -> String {
    let mut key = ty.clone();
    key.is_array = false;
    render_type(&key)
}

fn inherited_members(
    ty: &ApiType,
    refs: &[ApiType],
    out: &mut Vec<ApiMember>,
    seen: &mut Vec<String>,
) {
    for base in ty.extends_slice() {
        if seen.iter().any(|s| s == base.name_str()) {
            continue;
        }
        seen.push(base.name_str().to_string());
        if let Some(expanded) = create_type_from_reference(base, refs) {
            inherited_members(&expanded, refs, out, seen);
            out.extend(expanded.members_slice().iter().cloned());
        }
    }
}

fn object_of(members: &[ApiMember], refs: &[ApiType], expanding: &mut Expanding) -> Value {
    let mut object = Map::new();
    for member in members {
        let value = match &member.ty {
            Some(ty) => value_of(ty, refs, expanding),
            None => Value::Null,
        };
        object.insert(member.name.clone(), value);
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn interface(name: &str, members: Vec<ApiMember>) -> ApiType {
        let mut ty = ApiType::named(TypeKind::Interface, name);
        ty.members = Some(members);
        ty
    }

    #[test]
    fn test_simple_values() {
        assert_eq!(make_type_value(&ApiType::simple("any"), &[]), json!({}));
        assert_eq!(make_type_value(&ApiType::simple("string"), &[]), json!("value"));
        assert_eq!(make_type_value(&ApiType::simple("boolean"), &[]), json!(false));
        assert_eq!(make_type_value(&ApiType::simple("number").into_array(), &[]), json!([1]));
        assert_eq!(make_type_value(&ApiType::void().into_array(), &[]), json!(null));
    }

    #[test]
    fn test_interface_keys_match_members() {
        let refs = vec![interface(
            "ISimple",
            vec![
                ApiMember::field("id", ApiType::simple("string"), false),
                ApiMember::field("count", ApiType::simple("number"), true),
            ],
        )];
        let value = make_type_value(&ApiType::named(TypeKind::InterfaceRef, "ISimple"), &refs);
        let text = serde_json::to_string(&value).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        let keys: Vec<&String> = parsed.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["id", "count"]);
    }

    #[test]
    fn test_inherited_members_come_first() {
        let mut child = interface(
            "IChild",
            vec![ApiMember::field("own", ApiType::simple("boolean"), false)],
        );
        child.extends = Some(vec![ApiType::named(TypeKind::InterfaceRef, "IBase")]);
        let refs = vec![
            child,
            interface(
                "IBase",
                vec![ApiMember::field("base", ApiType::simple("number"), false)],
            ),
        ];
        let value = make_type_value(&ApiType::named(TypeKind::InterfaceRef, "IChild"), &refs);
        assert_eq!(value, json!({ "base": 1, "own": false }));
    }

    #[test]
    fn test_enum_and_union() {
        let mut moods = ApiType::named(TypeKind::Enum, "Moods");
        moods.members = Some(vec![ApiMember::ordinal("Happy", 0), ApiMember::ordinal("Sad", 4)]);
        let refs = vec![moods];
        let union = ApiType::composite(
            true,
            vec![ApiType::named(TypeKind::EnumRef, "Moods"), ApiType::simple("string")],
        )
        .into_array();
        assert_eq!(make_type_value(&union, &refs), json!([0]));
    }

    #[test]
    fn test_cyclic_reference_terminates() {
        let refs = vec![interface(
            "INode",
            vec![
                ApiMember::field("name", ApiType::simple("string"), false),
                ApiMember::field(
                    "children",
                    ApiType::named(TypeKind::InterfaceRef, "INode").into_array(),
                    false,
                ),
                ApiMember::field("parent", ApiType::named(TypeKind::InterfaceRef, "INode"), true),
            ],
        )];
        let value = make_type_value(&ApiType::named(TypeKind::InterfaceRef, "INode"), &refs);
        assert_eq!(value, json!({ "name": "value", "children": [], "parent": null }));
    }

    fn boxed(arg: ApiType) -> ApiType {
        let mut ty = ApiType::named(TypeKind::InterfaceRef, "IBox");
        ty.args = Some(vec![arg]);
        ty
    }

    #[test]
    fn test_nested_use_of_same_generic() {
        let mut ibox = interface(
            "IBox",
            vec![ApiMember::field("v", ApiType::named(TypeKind::TypeParam, "T"), false)],
        );
        ibox.args = Some(vec![ApiType::named(TypeKind::TypeArg, "T")]);
        let refs = vec![
            ibox,
            interface(
                "IOuter",
                vec![ApiMember::field("b", boxed(boxed(ApiType::simple("string"))), false)],
            ),
        ];
        let value = make_type_value(&ApiType::named(TypeKind::InterfaceRef, "IOuter"), &refs);
        assert_eq!(value, json!({ "b": { "v": { "v": "value" } } }));
    }

    #[test]
    fn test_growing_generic_is_bounded() {
        // interface IGrow<T> { next?: IGrow<IBox<T>> }
        let mut next = ApiType::named(TypeKind::InterfaceRef, "IGrow");
        next.args = Some(vec![boxed(ApiType::named(TypeKind::TypeParam, "T"))]);
        let mut grow = interface("IGrow", vec![ApiMember::field("next", next, true)]);
        grow.args = Some(vec![ApiType::named(TypeKind::TypeArg, "T")]);
        let refs = vec![grow];

        let mut root = ApiType::named(TypeKind::InterfaceRef, "IGrow");
        root.args = Some(vec![ApiType::simple("string")]);
        let mut value = &make_type_value(&root, &refs);
        let mut depth = 0;
        while let Some(next) = value.get("next") {
            value = next;
            depth += 1;
        }
        assert_eq!(depth, MAX_GENERIC_DEPTH);
        assert_eq!(value, &Value::Null);
    }
}
