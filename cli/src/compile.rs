#![deny(missing_docs)]

//! # Compile Command
//!
//! Statically compiles decorated TypeScript controllers and prints the Api.
//!
//! 1. **Collect**: Files are taken as given; directories are walked for `.ts`
//!    and `.tsx` files, skipping `node_modules`.
//! 2. **Register**: Middleware declared in source with `middlewareFunction` /
//!    `middlewareProviderFunction` decorators seeds the registry.
//! 3. **Compile**: The source compiler builds the Api, which is written as
//!    JSON or YAML. Build errors give a non-zero exit status.

use crate::error::{CliError, CliResult};
use routemeta_core::compiler::{MetadataCompiler, SourceCodeCompiler};
use routemeta_core::{Api, CompilerConfig, MiddlewareRegistry};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Serialization format of the command output.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

/// Source selection and output options shared by the commands.
#[derive(clap::Args, Debug, Clone)]
pub struct SourceArgs {
    /// Source files or directories.
    #[clap(required = true)]
    pub paths: Vec<PathBuf>,

    /// Compiler configuration file (YAML).
    #[clap(long, env = "ROUTEMETA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[clap(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Write the output to this file instead of stdout.
    #[clap(long, short)]
    pub output: Option<PathBuf>,
}

/// Arguments for the compile command.
#[derive(clap::Args, Debug, Clone)]
pub struct CompileArgs {
    /// Sources and output.
    #[clap(flatten)]
    pub source: SourceArgs,
}

/// Expands directories into the TypeScript files below them.
///
/// Plain paths are kept as given, so a missing file surfaces as a build error.
pub fn collect_sources(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for path in paths {
        if !path.is_dir() {
            sources.push(path.clone());
            continue;
        }
        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != "node_modules");
        for entry in walker {
            match entry {
                Ok(entry) if is_typescript(entry.path()) => sources.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry: {}", e),
            }
        }
    }
    sources
}

fn is_typescript(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext == "ts" || ext == "tsx")
}

/// Loads the configuration and compiles the selected sources.
pub fn compile_sources(args: &SourceArgs) -> CliResult<Api> {
    let config = match &args.config {
        Some(path) => CompilerConfig::load(path)?,
        None => CompilerConfig::default(),
    };
    let sources = collect_sources(&args.paths);
    if sources.is_empty() {
        return Err(CliError::General("no TypeScript sources found".to_string()));
    }
    info!("Compiling {} source files", sources.len());

    let mut compiler = SourceCodeCompiler::load(&sources, config)?;
    let registry = MiddlewareRegistry::from_declarations(&compiler.middleware_declarations());
    info!("{} middleware keys declared in source", registry.len());
    Ok(compiler.compile(&registry))
}

/// Serializes `value` to the requested output.
pub fn write_output<T: Serialize>(value: &T, args: &SourceArgs) -> CliResult<()> {
    let mut text = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    match &args.output {
        Some(path) => {
            fs::write(path, text)?;
            info!("Wrote {}", path.display());
        }
        None => std::io::stdout().write_all(text.as_bytes())?,
    }
    Ok(())
}

/// Executes the compile command.
pub fn execute(args: &CompileArgs) -> CliResult<()> {
    let api = compile_sources(&args.source)?;
    write_output(&api, &args.source)?;
    if api.is_valid() {
        Ok(())
    } else {
        Err(CliError::InvalidApi(api.errors.len()))
    }
}
