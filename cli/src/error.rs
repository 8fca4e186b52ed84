#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use derive_more::{Display, From};
use routemeta_core::AppError;

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {}", _0)]
    Io(std::io::Error),

    /// Failure reported by the core library.
    #[display("{}", _0)]
    App(AppError),

    /// JSON output failure.
    #[display("JSON Error: {}", _0)]
    Json(serde_json::Error),

    /// YAML output failure.
    #[display("YAML Error: {}", _0)]
    Yaml(serde_yaml::Error),

    /// The compiled Api carries build errors.
    #[from(ignore)]
    #[display("Compilation finished with {} errors", _0)]
    InvalidApi(usize),

    /// General failure message.
    #[display("Operation failed: {}", _0)]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for CliError {}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
