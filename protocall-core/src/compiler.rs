//! # Interface Compiler
//!
//! Runs the external schema compiler (`protoc`) to turn a `.proto` package into loadable
//! bindings inside a [`Workspace`].
//!
//! Each package yields two artifacts, both encoded `FileDescriptorSet`s:
//!
//! * **Message bindings** (`<root>_pb.binpb`): the package and every file it imports.
//! * **Service bindings** (`<root>_pb_grpc.binpb`): only the package's own file, which is
//!   where its service definitions live.
//!
//! `<root>` is the root segment of the package name, see [`root_segment`].
use crate::bindings::BindingKind;
use crate::config::{EngineConfig, absolute};
use crate::workspace::Workspace;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Invalid interface package name '{0}'")]
    InvalidPackage(String),

    #[error("Failed to spawn schema compiler '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema compiler failed for '{package}' ({status}): {stderr}")]
    Failed {
        package: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Package '{package}' shares the binding stem '{root}' with '{existing}'")]
    DuplicateRoot {
        package: String,
        root: String,
        existing: String,
    },

    #[error(transparent)]
    Workspace(#[from] crate::workspace::WorkspaceError),
}

/// The artifacts produced for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPackage {
    pub package: String,
    pub message_bindings: PathBuf,
    pub service_bindings: PathBuf,
}

/// Returns the root segment of a package name: its file name up to the first `.`.
///
/// `order.proto` -> `order`, `protos/v1/order.v1.proto` -> `order`.
pub fn root_segment(package: &str) -> Option<&str> {
    let file_name = package.rsplit(['/', '\\']).next()?;
    let root = file_name.split('.').next()?;
    (!root.is_empty()).then_some(root)
}

fn check_distinct_roots(package: &str, dependents: &[String]) -> Result<(), CompileError> {
    let mut seen: Vec<(&str, &str)> = Vec::with_capacity(dependents.len() + 1);

    for name in std::iter::once(package).chain(dependents.iter().map(String::as_str)) {
        let root =
            root_segment(name).ok_or_else(|| CompileError::InvalidPackage(name.to_string()))?;

        if let Some((_, existing)) = seen.iter().find(|(r, _)| *r == root) {
            return Err(CompileError::DuplicateRoot {
                package: name.to_string(),
                root: root.to_string(),
                existing: existing.to_string(),
            });
        }
        seen.push((root, name));
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct InterfaceCompiler {
    protoc: PathBuf,
    include_dirs: Vec<PathBuf>,
    working_dir: PathBuf,
}

impl InterfaceCompiler {
    pub fn new(config: &EngineConfig) -> Self {
        // A bare name is looked up on PATH; anything with a directory is pinned before
        // the working directory changes.
        let protoc = if config.protoc.components().count() > 1 {
            absolute(&config.protoc)
        } else {
            config.protoc.clone()
        };

        Self {
            protoc,
            include_dirs: config.include_dirs(),
            working_dir: config.base_dir(),
        }
    }

    pub fn protoc(&self) -> &Path {
        &self.protoc
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    /// Compiles `package` into `workspace`, adding to whatever is already there.
    pub async fn compile(
        &self,
        package: &str,
        workspace: &Workspace,
    ) -> Result<CompiledPackage, CompileError> {
        let root =
            root_segment(package).ok_or_else(|| CompileError::InvalidPackage(package.into()))?;

        let message_bindings = workspace.path().join(BindingKind::Messages.file_name(root));
        let service_bindings = workspace.path().join(BindingKind::Services.file_name(root));

        self.run(package, &message_bindings, true).await?;
        self.run(package, &service_bindings, false).await?;

        tracing::debug!(
            package,
            workspace = %workspace.path().display(),
            "Generated message and service bindings"
        );

        Ok(CompiledPackage {
            package: package.to_string(),
            message_bindings,
            service_bindings,
        })
    }

    /// Compiles the main package, then each dependent in order, into the same workspace.
    ///
    /// Stops at the first failure; the error names the package that failed. Packages whose
    /// root segments coincide would overwrite each other's bindings and are rejected before
    /// anything runs.
    pub async fn compile_all(
        &self,
        package: &str,
        dependents: &[String],
        workspace: &Workspace,
    ) -> Result<Vec<CompiledPackage>, CompileError> {
        check_distinct_roots(package, dependents)?;

        let mut compiled = Vec::with_capacity(dependents.len() + 1);

        compiled.push(self.compile(package, workspace).await?);
        for dependent in dependents {
            compiled.push(self.compile(dependent, workspace).await?);
        }

        Ok(compiled)
    }

    fn args(&self, package: &str, out: &Path, include_imports: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = self
            .include_dirs
            .iter()
            .map(|dir| {
                let mut arg = OsString::from("--proto_path=");
                arg.push(dir);
                arg
            })
            .collect();

        if include_imports {
            args.push("--include_imports".into());
        }

        let mut out_arg = OsString::from("--descriptor_set_out=");
        out_arg.push(out);
        args.push(out_arg);
        args.push(package.into());
        args
    }

    async fn run(
        &self,
        package: &str,
        out: &Path,
        include_imports: bool,
    ) -> Result<(), CompileError> {
        let args = self.args(package, out, include_imports);
        tracing::debug!(program = %self.protoc.display(), ?args, "Running schema compiler");

        // kill_on_drop terminates the child if this future is dropped before it exits.
        let child = Command::new(&self.protoc)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CompileError::Spawn {
                program: self.protoc.clone(),
                source,
            })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| CompileError::Spawn {
                program: self.protoc.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CompileError::Failed {
                package: package.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}
