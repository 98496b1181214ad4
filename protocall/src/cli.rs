//! # CLI
//!
//! This module defines the command-line interface of `protocall` using `clap`.
//!
//! Global flags override the values `protocall_core` reads from the environment.
use clap::{Parser, Subcommand};
use protocall_core::config::EngineConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "protocall",
    version,
    about = "Invoke unary gRPC methods straight from .proto sources"
)]
pub struct Cli {
    /// Project root (defaults to $PROJECT_PATH, then the current directory)
    #[arg(long, global = true)]
    pub project_root: Option<PathBuf>,

    /// Directory holding the .proto sources, overriding the project layout
    #[arg(long, global = true)]
    pub include: Option<PathBuf>,

    /// Additional --proto_path entries for imports outside the include directory
    #[arg(long = "proto-path", global = true)]
    pub proto_paths: Vec<PathBuf>,

    /// The protoc executable (defaults to $PROTOC, then `protoc` on the PATH)
    #[arg(long, global = true)]
    pub protoc: Option<PathBuf>,

    /// Give every invocation its own workspace directory
    #[arg(long, global = true)]
    pub isolate: bool,

    /// Log every pipeline stage
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Perform a unary gRPC call described by a JSON request file
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// protocall call get_order.json
    /// ```
    ///
    /// where `get_order.json` contains:
    ///
    /// ```json
    /// {
    ///   "protoPackage": "order.proto",
    ///   "connect": { "host": "localhost", "port": "50051" },
    ///   "service": "OrderService/GetOrder",
    ///   "input": { "orderId": "123" }
    /// }
    /// ```
    Call {
        /// Path to the invocation request (.json)
        input: PathBuf,
    },

    /// Compile a package and list its services, methods and stubs
    List {
        /// The .proto package, relative to the include directory
        package: String,

        /// Packages compiled into the same workspace
        #[arg(short, long = "dependent")]
        dependents: Vec<String>,
    },
}

impl Cli {
    /// Applies the command-line overrides on top of `config`.
    pub fn engine_config(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(root) = &self.project_root {
            config = config.with_project_root(root);
        }
        if let Some(include) = &self.include {
            config = config.with_include_dir(include);
        }
        if let Some(protoc) = &self.protoc {
            config = config.with_protoc(protoc);
        }
        config.extra_includes.extend(self.proto_paths.iter().cloned());

        let isolate = self.isolate || config.isolate_workspaces;
        config.with_isolated_workspaces(isolate)
    }
}
