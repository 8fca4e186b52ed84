#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Helper functions for deriving route paths, route names and defaults from
//! controller and member declarations.

use crate::model::Verb;

/// Content type assumed when a route does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

fn is_empty_route(route: Option<&str>) -> bool {
    matches!(route, None | Some("") | Some("/"))
}

fn ensure_slash(route: &str) -> String {
    if route.starts_with('/') {
        route.to_string()
    } else {
        format!("/{}", route)
    }
}

/// Joins a controller prefix and a member path into the final route path.
///
/// e.g. `("simple", ":id")` -> `/simple/:id`, `(None, "")` -> `/`
pub fn make_route(prefix: Option<&str>, member_route: Option<&str>) -> String {
    match (is_empty_route(prefix), is_empty_route(member_route)) {
        (true, true) => "/".to_string(),
        (true, false) => ensure_slash(member_route.unwrap_or_default()),
        (false, true) => ensure_slash(prefix.unwrap_or_default()),
        (false, false) => format!(
            "{}{}",
            ensure_slash(prefix.unwrap_or_default()),
            ensure_slash(member_route.unwrap_or_default())
        ),
    }
}

/// Derives the route name `controller_member`.
pub fn make_route_name(controller: &str, member: &str) -> String {
    if controller.is_empty() {
        member.to_string()
    } else {
        format!("{}_{}", controller, member)
    }
}

/// Verbs used when a route does not declare any: the member name itself when
/// it is a verb token, otherwise `get`.
pub fn default_verbs(member: &str) -> Vec<Verb> {
    match member.parse::<Verb>() {
        Ok(verb) => vec![verb],
        Err(_) => vec![Verb::Get],
    }
}

/// Member path used when a route does not declare one.
pub fn default_route() -> &'static str {
    ""
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_route_empty_parts() {
        assert_eq!(make_route(None, None), "/");
        assert_eq!(make_route(Some("/"), Some("")), "/");
        assert_eq!(make_route(None, Some(":id")), "/:id");
        assert_eq!(make_route(Some("simple"), None), "/simple");
    }

    #[test]
    fn test_make_route_joins() {
        assert_eq!(make_route(Some("/simple"), Some(":id")), "/simple/:id");
        assert_eq!(make_route(Some("simple"), Some("/a/b")), "/simple/a/b");
    }

    #[test]
    fn test_make_route_name() {
        assert_eq!(make_route_name("simple", "getAll"), "simple_getAll");
        assert_eq!(make_route_name("", "getAll"), "getAll");
    }

    #[test]
    fn test_default_verbs() {
        assert_eq!(default_verbs("post"), vec![Verb::Post]);
        assert_eq!(default_verbs("delete"), vec![Verb::Delete]);
        assert_eq!(default_verbs("getAll"), vec![Verb::Get]);
        assert_eq!(default_verbs("Post"), vec![Verb::Get]);
    }
}
