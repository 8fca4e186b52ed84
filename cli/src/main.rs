#![deny(missing_docs)]

//! # Routemeta CLI
//!
//! Command Line Interface for the route-metadata compiler.
//!
//! Supported Commands:
//! - `compile`: Statically compiles decorated controllers into the Api model.
//! - `client`: Builds the client generator model from the same sources.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

mod client;
mod compile;
mod error;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Route metadata compiler")]
struct Cli {
    /// Log filter (e.g. `warn`, `routemeta_core=debug`).
    #[clap(long, global = true, env = "ROUTEMETA_LOG", default_value = "warn")]
    log_level: String,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile sources and print the Api model.
    Compile(compile::CompileArgs),
    /// Compile sources and print the client generator model.
    Client(client::ClientArgs),
}

/// `RUST_LOG` wins over `--log-level`.
fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter);
    if subscriber.try_init().is_err() {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match &cli.command {
        Commands::Compile(args) => compile::execute(args)?,
        Commands::Client(args) => client::execute(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compile_args() {
        let cli = Cli::try_parse_from([
            "routemeta",
            "compile",
            "src/api",
            "--format",
            "yaml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Compile(args) => {
                assert_eq!(args.source.paths, vec![std::path::PathBuf::from("src/api")]);
                assert_eq!(args.source.format, compile::OutputFormat::Yaml);
            }
            Commands::Client(_) => panic!("expected compile"),
        }
    }
}
