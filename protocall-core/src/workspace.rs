//! # Workspace
//!
//! The disposable directory that holds one invocation's compiled bindings.
//!
//! A [`Workspace`] is a scoped resource: acquiring it resets the directory (anything already
//! at the path is deleted), and releasing it deletes the directory again. Release happens
//! explicitly through [`Workspace::close`] or implicitly on drop, so early returns and
//! failures never leave generated artifacts behind.
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Failed to reset workspace '{path}': {source}")]
    Reset {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create workspace '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to remove workspace '{path}': {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    released: bool,
}

impl Workspace {
    /// Deletes whatever exists at `path` and creates it again, empty.
    pub fn recreate(path: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let path = path.into();

        remove_if_exists(&path).map_err(|source| WorkspaceError::Reset {
            path: path.clone(),
            source,
        })?;

        std::fs::create_dir_all(&path).map_err(|source| WorkspaceError::Create {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Workspace created");

        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the workspace, reporting failures instead of logging them.
    pub fn close(mut self) -> Result<(), WorkspaceError> {
        self.released = true;
        remove_if_exists(&self.path).map_err(|source| WorkspaceError::Remove {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "Workspace removed");
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        match remove_if_exists(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Workspace removed"),
            Err(err) => tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "Failed to remove workspace"
            ),
        }
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
