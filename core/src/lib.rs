#![deny(missing_docs)]

//! # Routemeta Core
//!
//! Compiles route metadata of declaratively defined API controllers into a
//! single validated [`Api`] model, either from runtime registrations or by
//! statically analysing decorated TypeScript sources.

/// Shared error types.
pub mod error;

/// Route naming helpers.
pub mod naming;

/// Structural type model.
pub mod types;

/// Api model.
pub mod model;

/// Middleware registry and resolution.
pub mod middleware;

/// Compiler configuration.
pub mod config;

/// Traversals over compiled models.
pub mod explorer;

/// Fluent controller registration.
pub mod registration;

/// Final Api validation.
pub mod builder;

/// Parsed TypeScript program.
pub mod source;

/// Type extraction engine.
pub mod resolver;

/// Metadata compilers.
pub mod compiler;

/// Route binding boundary.
pub mod binding;

/// Client generator model.
pub mod client;

pub use binding::{RequestChain, RouteBinder, RouteBuilder, RouteTable};
pub use builder::ApiBuilder;
pub use client::ApiClient;
pub use compiler::{MetadataCompiler, RuntimeCompiler, SourceCodeCompiler};
pub use config::CompilerConfig;
pub use error::{AppError, AppResult, BuildError};
pub use middleware::{MiddlewareRegistry, ResolvedMiddleware};
pub use model::{Api, ControllerDescriptor, MiddlewareRef, RouteDescriptor, Verb};
pub use registration::{ControllerRegistration, ControllerRegistry, RouteRegistration};
pub use resolver::TypeResolver;
pub use types::{ApiMember, ApiType, RouteTypes, TypeKind};
