//! # Protocall CLI Entry Point
//!
//! The main executable for the Protocall tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the
//!    `tracing` subscriber.
//! 2. **Configuration**: Reads the environment and applies the command-line overrides.
//! 3. **Execution**: Delegates to the `protocall_core` invocation engine.
//! 4. **Presentation**: Formats and prints the response or error to standard output/error.

mod cli;
mod formatter;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use formatter::{FormattedString, ServiceTable};
use protocall_core::{config::EngineConfig, engine::InvocationEngine, request::InvocationRequest};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let engine = InvocationEngine::new(args.engine_config(EngineConfig::from_env()));

    let result = match args.command {
        Commands::Call { input } => run_call(&engine, &input).await,
        Commands::List {
            package,
            dependents,
        } => list_services(&engine, &package, &dependents).await,
    };

    if let Err(err) = result {
        eprintln!("{}", FormattedString::from(err));
        process::exit(1);
    }
}

/// Logs go to stderr so stdout only ever carries the response.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

async fn run_call(engine: &InvocationEngine, input: &Path) -> anyhow::Result<()> {
    let request = InvocationRequest::from_path(input)
        .with_context(|| format!("Failed to load request '{}'", input.display()))?;

    tracing::debug!(
        package = %request.interface_package,
        method = %request.method_path,
        "Request loaded"
    );

    let response = engine.invoke(request).await?;
    println!("{}", FormattedString::from(response));
    Ok(())
}

async fn list_services(
    engine: &InvocationEngine,
    package: &str,
    dependents: &[String],
) -> anyhow::Result<()> {
    let registry = engine.inspect(package, dependents).await?;
    println!("{}", FormattedString::from(ServiceTable(&registry)));
    Ok(())
}
