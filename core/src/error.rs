#![deny(missing_docs)]

//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace, and the
//! `BuildError` taxonomy accumulated into an `Api` during compilation.

use derive_more::{Display, From};
use serde::{Serialize, Serializer};

/// The Global Error Enum.
///
/// These are failures that make a compile or bind impossible. Problems found
/// inside the compiled model are never reported this way, see [`BuildError`].
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The source front end could not be initialised or could not parse a file.
    #[from(ignore)]
    #[display("Parse Error: {_0}")]
    Parse(String),

    /// Invalid compiler configuration.
    #[from(ignore)]
    #[display("Config Error: {_0}")]
    Config(String),

    /// An Api carrying build errors was handed to a route binder.
    #[from(ignore)]
    #[display("Bind Error: {_0}")]
    Bind(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

/// A problem found while building an `Api` model.
///
/// Build errors are accumulated, never thrown: one compile call surfaces every
/// problem at once. The `Display` text is the user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum BuildError {
    /// The same (path, verb) pair is claimed by more than one route.
    #[display("Duplicate route ({verb}: {path}) found for {}", offenders.join(","))]
    DuplicateRoute {
        /// Verb of the clashing pair.
        verb: String,
        /// Path of the clashing pair.
        path: String,
        /// Every `controller.member` claiming the pair.
        offenders: Vec<String>,
    },

    /// A referenced middleware key has no registry entry.
    #[display("Missing middleware key '{_0}'")]
    MissingMiddleware(String),

    /// A provider invocation (key with parameters) has no registry entry.
    #[display("Missing middleware provider with key '{_0}'")]
    MissingMiddlewareProvider(String),

    /// A bare key references a provider that requires parameters.
    #[display(
        "Middleware key '{key}' requires parameters that have not been specified (you must specify minimum of {min}, max of {max})"
    )]
    MiddlewareParamsMissing {
        /// Middleware key.
        key: String,
        /// Minimum accepted parameter count.
        min: usize,
        /// Maximum accepted parameter count.
        max: usize,
    },

    /// A middleware reference supplies a parameter count outside the registered bounds.
    #[display(
        "Middleware key '{key}' requires parameters that have not been specified correctly ({} provided [{}], min = {min}, max = {max})",
        params.len(),
        params.join(",")
    )]
    MiddlewareArityMismatch {
        /// Middleware key.
        key: String,
        /// Rendered parameters that were supplied.
        params: Vec<String>,
        /// Minimum accepted parameter count.
        min: usize,
        /// Maximum accepted parameter count.
        max: usize,
    },

    /// A named type reference cannot be located in the compiled program.
    #[display("Declaration not found for Type Reference name: {_0}")]
    UnresolvedType(String),

    /// A route handler has the wrong parameter count or request shape.
    #[display("{_0}")]
    MalformedRouteSignature(String),

    /// A supplied file path is not part of the compiled program.
    #[display("Invalid Source Path: {_0}")]
    InvalidSourcePath(String),

    /// A type name resolves to more than one declaration.
    #[display("Multiple declarations found for Type Reference name: {_0}")]
    MultipleDeclarations(String),

    /// A name resolves to a declaration that cannot describe a type (e.g. a class).
    #[display("Unknown kind for Type Reference: {kind} - {name}")]
    UnsupportedTypeReference {
        /// Syntax kind of the declaration found.
        kind: String,
        /// Referenced name.
        name: String,
    },

    /// A type expression uses syntax outside the supported contract shapes.
    #[display("Unknown SyntaxKind encountered: {_0}")]
    UnsupportedSyntax(String),

    /// An interface member uses syntax that cannot be extracted.
    #[display("Unknown Member Syntax Kind '{kind}' on Interface type: {owner} - {member}")]
    UnsupportedMember {
        /// Syntax kind of the member.
        kind: String,
        /// Interface declaring the member.
        owner: String,
        /// Member name.
        member: String,
    },

    /// A decorated route could not be matched to a member node in source.
    #[display("Unable to find Source Node for Controller '{controller}' - method '{member}'")]
    MissingSourceNode {
        /// Controller name.
        controller: String,
        /// Route member name.
        member: String,
    },
}

impl BuildError {
    /// Builds the malformed signature error for an unknown request type name.
    pub fn unknown_request_type(controller: &str, member: &str, name: &str) -> Self {
        BuildError::MalformedRouteSignature(format!(
            "Unknown Controller Action Parameter Type {} ({}.{})",
            name, controller, member
        ))
    }

    /// Builds the malformed signature error for a request type with the wrong argument count.
    pub fn request_type_arity(
        controller: &str,
        member: &str,
        name: &str,
        expected: usize,
        found: usize,
    ) -> Self {
        BuildError::MalformedRouteSignature(format!(
            "Request type '{}' on '{}.{}' requires {} type arguments (found {})",
            name, controller, member, expected, found
        ))
    }

    /// Builds the malformed signature error for a handler with the wrong parameter count.
    pub fn wrong_parameter_count(controller: &str, member: &str, found: usize) -> Self {
        BuildError::MalformedRouteSignature(format!(
            "Route handler '{}.{}' must declare exactly one request parameter (found {})",
            controller, member, found
        ))
    }
}

impl std::error::Error for BuildError {}

impl Serialize for BuildError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use std::path::Path;

    #[test]
    fn test_unreadable_config_is_io() {
        let err = CompilerConfig::load(Path::new("/nonexistent/routemeta.yaml")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        assert!(err.to_string().starts_with("IO Error: "));
    }

    #[test]
    fn test_unknown_config_key_is_config_error() {
        let err = CompilerConfig::from_yaml("request_types: [IReq]").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().starts_with("Config Error: "));
    }

    #[test]
    fn test_signature_messages() {
        assert_eq!(
            BuildError::unknown_request_type("users", "plain", "Promise").to_string(),
            "Unknown Controller Action Parameter Type Promise (users.plain)"
        );
        assert_eq!(
            BuildError::MissingSourceNode {
                controller: "users".into(),
                member: "remove".into(),
            }
            .to_string(),
            "Unable to find Source Node for Controller 'users' - method 'remove'"
        );
        assert_eq!(
            BuildError::MiddlewareParamsMissing {
                key: "limit".into(),
                min: 1,
                max: 2,
            }
            .to_string(),
            "Middleware key 'limit' requires parameters that have not been specified (you must specify minimum of 1, max of 2)"
        );
    }

    #[test]
    fn test_bind_manual_creation() {
        let app_err = AppError::Bind("2 errors".into());
        assert_eq!(format!("{}", app_err), "Bind Error: 2 errors");
    }

    #[test]
    fn test_duplicate_route_message() {
        let err = BuildError::DuplicateRoute {
            verb: "get".into(),
            path: "/simple/:id".into(),
            offenders: vec!["simple.get".into(), "simpleClash.get".into()],
        };
        assert_eq!(
            err.to_string(),
            "Duplicate route (get: /simple/:id) found for simple.get,simpleClash.get"
        );
    }

    #[test]
    fn test_arity_message() {
        let err = BuildError::MiddlewareArityMismatch {
            key: "limit".into(),
            params: vec!["1".into(), "\"a\"".into()],
            min: 1,
            max: 1,
        };
        assert_eq!(
            err.to_string(),
            "Middleware key 'limit' requires parameters that have not been specified correctly (2 provided [1,\"a\"], min = 1, max = 1)"
        );
    }

    #[test]
    fn test_serializes_as_message() {
        let err = BuildError::MissingMiddleware("missing-key".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Missing middleware key 'missing-key'\"");
    }
}
