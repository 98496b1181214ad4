//! # Engine Configuration
//!
//! Where the interface sources live, where workspaces are created and which `protoc`
//! binary to run. Values come from the environment ([`EngineConfig::from_env`]) and can be
//! overridden field by field by the caller.
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable holding the project root.
pub const PROJECT_PATH_ENV: &str = "PROJECT_PATH";
/// Environment variable naming the environment type (e.g. `staging`).
pub const ENV_TYPE_ENV: &str = "ENV_TYPE";
/// Environment variable naming the application type.
pub const APP_TYPE_ENV: &str = "APP_TYPE";
/// Environment variable overriding the `protoc` executable.
pub const PROTOC_ENV: &str = "PROTOC";

const DEFAULT_PROTOC: &str = "protoc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Base directory for workspaces and the `protoc` working directory.
    /// Falls back to the current working directory.
    pub project_root: Option<PathBuf>,
    /// Explicit include directory, taking precedence over everything else.
    pub include_dir: Option<PathBuf>,
    pub env_type: Option<String>,
    pub app_type: Option<String>,
    /// Additional `--proto_path` entries appended after the main include directory.
    pub extra_includes: Vec<PathBuf>,
    /// The schema compiler executable.
    pub protoc: PathBuf,
    /// Suffix every workspace with the invocation id so concurrent invocations never share one.
    pub isolate_workspaces: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            include_dir: None,
            env_type: None,
            app_type: None,
            extra_includes: Vec::new(),
            protoc: PathBuf::from(DEFAULT_PROTOC),
            isolate_workspaces: false,
        }
    }
}

impl EngineConfig {
    /// Builds a configuration from `PROJECT_PATH`, `ENV_TYPE`, `APP_TYPE` and `PROTOC`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        Self {
            project_root: non_empty(PROJECT_PATH_ENV).map(PathBuf::from),
            env_type: non_empty(ENV_TYPE_ENV).map(|v| v.to_string_lossy().into_owned()),
            app_type: non_empty(APP_TYPE_ENV).map(|v| v.to_string_lossy().into_owned()),
            protoc: non_empty(PROTOC_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROTOC)),
            ..Self::default()
        }
    }

    /// Directory in which workspaces are created and `protoc` runs.
    ///
    /// Always absolute: `protoc` runs from here, so paths handed to it must not depend on
    /// the caller's working directory.
    pub fn base_dir(&self) -> PathBuf {
        match &self.project_root {
            Some(root) => absolute(root),
            None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Include directory handed to `protoc`.
    ///
    /// Resolution order: explicit override, then `<root>/testinputs/<env>/<app>/proto_buffer`
    /// when a project root, env type and app type are all set, then the project root, then `.`.
    pub fn include_dir(&self) -> PathBuf {
        if let Some(dir) = &self.include_dir {
            return dir.clone();
        }

        match (&self.project_root, &self.env_type, &self.app_type) {
            (Some(root), Some(env_type), Some(app_type)) => root
                .join("testinputs")
                .join(env_type)
                .join(app_type)
                .join("proto_buffer"),
            (Some(root), _, _) => root.clone(),
            _ => PathBuf::from("."),
        }
    }

    /// All `--proto_path` entries as absolute paths, main include directory first.
    pub fn include_dirs(&self) -> Vec<PathBuf> {
        std::iter::once(self.include_dir())
            .chain(self.extra_includes.iter().cloned())
            .map(|dir| absolute(&dir))
            .collect()
    }

    /// Path of the workspace for `package`, e.g. `<base>/order_interface`.
    pub fn workspace_path(&self, root_segment: &str, invocation_id: &uuid::Uuid) -> PathBuf {
        let name = if self.isolate_workspaces {
            format!("{root_segment}_interface_{}", invocation_id.simple())
        } else {
            format!("{root_segment}_interface")
        };
        self.base_dir().join(name)
    }

    pub fn with_project_root(mut self, root: impl AsRef<Path>) -> Self {
        self.project_root = Some(root.as_ref().to_path_buf());
        self
    }

    pub fn with_include_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.include_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_protoc(mut self, protoc: impl AsRef<Path>) -> Self {
        self.protoc = protoc.as_ref().to_path_buf();
        self
    }

    pub fn with_isolated_workspaces(mut self, isolate: bool) -> Self {
        self.isolate_workspaces = isolate;
        self
    }
}

/// Resolves `path` against the current directory, leaving it untouched if that fails.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
