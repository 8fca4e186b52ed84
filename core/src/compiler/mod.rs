#![deny(missing_docs)]

//! # Metadata Compilers
//!
//! Two independent strategies that produce the same [`Api`] model: one reads
//! registrations made at runtime, the other analyses TypeScript source.

use crate::middleware::MiddlewareRegistry;
use crate::model::Api;

/// Compiler over in-memory controller registrations.
pub mod runtime;

/// Compiler over decorated TypeScript source.
pub mod source;

pub use runtime::RuntimeCompiler;
pub use source::SourceCodeCompiler;

/// A strategy for extracting an [`Api`] from controller metadata.
///
/// Implementors never fail: every problem found is recorded in
/// [`Api::errors`], and each call produces a fresh model.
pub trait MetadataCompiler {
    /// Compiles the model, resolving middleware against `middleware`.
    fn compile(&mut self, middleware: &MiddlewareRegistry) -> Api;
}
