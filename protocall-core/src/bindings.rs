//! # Binding Loader
//!
//! Makes the bindings generated by the [`crate::compiler`] addressable by the rest of the
//! engine. Bindings are produced fresh for every invocation, so there is no static path to
//! them; the loader finds them by naming convention and registers every descriptor they
//! define into a [`DescriptorRegistry`].
//!
//! ## Naming convention
//!
//! | File name                | Kind              |
//! |--------------------------|-------------------|
//! | `<stem>_pb_grpc.binpb`   | service bindings  |
//! | `<stem>_pb.binpb`        | message bindings  |
//!
//! Anything else in the workspace is ignored. `<stem>` is the root segment of the package
//! the file was compiled from.
use crate::compiler::root_segment;
use crate::registry::{DescriptorRegistry, RegisterError};
use crate::workspace::Workspace;
use prost::Message;
use prost_types::FileDescriptorSet;
use std::fmt;
use std::path::{Path, PathBuf};

const MESSAGE_SUFFIX: &str = "_pb.binpb";
const SERVICE_SUFFIX: &str = "_pb_grpc.binpb";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Invalid interface package name '{0}'")]
    InvalidPackage(String),

    #[error("Failed to scan workspace '{path}': {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} binding not found for '{package}' in '{workspace}'")]
    BindingNotFound {
        kind: BindingKind,
        package: String,
        workspace: PathBuf,
    },

    #[error("Failed to read binding '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode binding '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: prost::DecodeError,
    },

    #[error("Failed to register binding '{path}': {source}")]
    Register {
        path: PathBuf,
        #[source]
        source: RegisterError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Messages,
    Services,
}

impl BindingKind {
    /// Splits a binding file name into its stem and kind.
    pub fn classify(file_name: &str) -> Option<(&str, BindingKind)> {
        if let Some(stem) = file_name.strip_suffix(SERVICE_SUFFIX) {
            return (!stem.is_empty()).then_some((stem, BindingKind::Services));
        }
        if let Some(stem) = file_name.strip_suffix(MESSAGE_SUFFIX) {
            return (!stem.is_empty()).then_some((stem, BindingKind::Messages));
        }
        None
    }

    pub fn file_name(self, stem: &str) -> String {
        match self {
            BindingKind::Messages => format!("{stem}{MESSAGE_SUFFIX}"),
            BindingKind::Services => format!("{stem}{SERVICE_SUFFIX}"),
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Messages => f.write_str("Message"),
            BindingKind::Services => f.write_str("Service"),
        }
    }
}

/// A binding file found in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingFile {
    pub stem: String,
    pub kind: BindingKind,
    pub path: PathBuf,
}

/// Lists the binding files in `dir`, sorted by file name.
pub fn scan(dir: &Path) -> Result<Vec<BindingFile>, LoadError> {
    let scan_error = |source| LoadError::Scan {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(scan_error)? {
        let entry = entry.map_err(scan_error)?;
        if !entry.file_type().map_err(scan_error)?.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };

        if let Some((stem, kind)) = BindingKind::classify(file_name) {
            files.push(BindingFile {
                stem: stem.to_string(),
                kind,
                path: entry.path(),
            });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Loads the bindings of `package` from `workspace` into a fresh registry.
///
/// The package's message bindings are registered first, followed by the message bindings
/// of any dependent package compiled into the same workspace. Only the package's own
/// service bindings feed the stub table.
pub fn load(workspace: &Workspace, package: &str) -> Result<DescriptorRegistry, LoadError> {
    let root = root_segment(package).ok_or_else(|| LoadError::InvalidPackage(package.into()))?;
    let files = scan(workspace.path())?;

    let select = |kind: BindingKind| {
        files
            .iter()
            .find(|f| f.kind == kind && f.stem == root)
            .ok_or_else(|| LoadError::BindingNotFound {
                kind,
                package: package.to_string(),
                workspace: workspace.path().to_path_buf(),
            })
    };

    let messages = select(BindingKind::Messages)?;
    let services = select(BindingKind::Services)?;

    let mut registry = DescriptorRegistry::new();

    register_messages(&mut registry, messages)?;
    for dependent in files
        .iter()
        .filter(|f| f.kind == BindingKind::Messages && f.stem != root)
    {
        register_messages(&mut registry, dependent)?;
    }

    let set = read_set(&services.path)?;
    let registered = registry
        .register_services(set)
        .map_err(|source| LoadError::Register {
            path: services.path.clone(),
            source,
        })?;

    tracing::debug!(
        package,
        services = ?registered,
        "Loaded bindings"
    );

    Ok(registry)
}

fn register_messages(
    registry: &mut DescriptorRegistry,
    binding: &BindingFile,
) -> Result<(), LoadError> {
    let set = read_set(&binding.path)?;
    registry
        .register_messages(set)
        .map_err(|source| LoadError::Register {
            path: binding.path.clone(),
            source,
        })
}

fn read_set(path: &Path) -> Result<FileDescriptorSet, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    FileDescriptorSet::decode(bytes.as_slice()).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
