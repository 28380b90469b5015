//! `switchyard` binary: serves the demo actions over stdin and stdout.
//!
//! Each input line is one JSON-RPC 2.0 request; each response is written as
//! one line. Logs go to stderr. Pass `--describe true` to print the service
//! description instead of serving.

mod demo;

use std::io::{self, Write};
use std::process::ExitCode;

use thiserror::Error;
use tracing::error;

use switchyard::{
    BootstrapError, BuildError, DispatchError, HandlerBuilder, ServerError, SystemConfigLoader,
    bootstrap_with, serve,
};

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error("failed to register actions: {0}")]
    Build(#[from] BuildError),
    #[error("failed to describe actions: {0}")]
    Describe(#[from] DispatchError),
    #[error("failed to write description: {0}")]
    Output(#[from] io::Error),
    #[error(transparent)]
    Serve(#[from] ServerError),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(target: "switchyard::main", error = %failure, "switchyard exited with an error");
            if let Err(write_error) = writeln!(io::stderr(), "switchyard: {failure}") {
                error!(target: "switchyard::main", error = %write_error, "failed to report error");
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RunError> {
    let bootstrapped = bootstrap_with(&SystemConfigLoader)?;
    let config = bootstrapped.config();

    let mut builder = HandlerBuilder::from_config(config);
    builder
        .add_callable_handle(demo::callables())?
        .add_service_handle(demo::services())?;

    if config.describe() {
        let description = builder.build_doc_extractor().extract()?;
        let rendered = description.to_json_pretty().map_err(io::Error::from)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{rendered}")?;
        return Ok(());
    }

    let handler = builder.build_handler();
    serve(io::stdin().lock(), io::stdout().lock(), &handler)?;
    Ok(())
}
