#![deny(missing_docs)]

//! # Client Command
//!
//! Compiles the sources like `compile`, then prints the client generator
//! model: rendered reference declarations and the typed routes of every
//! controller.

use crate::compile::{compile_sources, write_output, SourceArgs};
use crate::error::{CliError, CliResult};
use routemeta_core::ApiClient;

/// Arguments for the client command.
#[derive(clap::Args, Debug, Clone)]
pub struct ClientArgs {
    /// Sources and output.
    #[clap(flatten)]
    pub source: SourceArgs,
}

/// Executes the client command.
pub fn execute(args: &ClientArgs) -> CliResult<()> {
    let api = compile_sources(&args.source)?;
    if !api.is_valid() {
        return Err(CliError::InvalidApi(api.errors.len()));
    }
    write_output(&ApiClient::from_api(&api), &args.source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::OutputFormat;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_client_model_written() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("ping.ts"),
            r#"
interface IApiVoidRequest<TResponse, TParams, TQuery> {}
interface IPong { at: number; }
@api.controller("ping")
class Ping {
    @api.route("ping")
    get(req: IApiVoidRequest<IPong, void, void>) {}
}
"#,
        )
        .unwrap();
        let output = dir.path().join("client.json");
        let args = ClientArgs {
            source: SourceArgs {
                paths: vec![dir.path().to_path_buf()],
                config: None,
                format: OutputFormat::Json,
                output: Some(output.clone()),
            },
        };

        execute(&args).unwrap();
        let client: ApiClient = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(client.refs, vec!["interface IPong {\n  at: number;\n}"]);
        assert_eq!(client.controllers[0].type_name, "ping");
        assert_eq!(client.controllers[0].routes[0].route, "/ping");
        assert_eq!(client.controllers[0].routes[0].response_type, "IPong");
    }
}
