use std::path::{Component, Path, PathBuf};

use crate::eject::EjectError;

/// Working directory of one build: `<root>/<repository>/<build id>`.
///
/// Scoped by build id, never by application, so concurrent builds of the
/// same application never share a directory. The directory is deleted by
/// [`Workspace::remove`] or, failing that, when the value is dropped.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Create a fresh, empty workspace. Leftovers from an earlier attempt
    /// with the same build id are removed first.
    pub fn create(root: &Path, repository: &str, build_id: &str) -> Result<Self, BuildContextError> {
        validate_repository(repository)?;
        validate_build_id(build_id)?;

        let path = root.join(repository.trim_matches('/')).join(build_id);

        if path.exists() {
            std::fs::remove_dir_all(&path).map_err(|e| BuildContextError::Cleanup {
                path: path.clone(),
                source: e,
            })?;
        }
        std::fs::create_dir_all(&path).map_err(|e| BuildContextError::Create {
            path: path.clone(),
            source: e,
        })?;

        tracing::debug!(path = %path.display(), "workspace created");
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the workspace directory. A directory that is already gone
    /// counts as removed.
    pub fn remove(mut self) -> Result<(), BuildContextError> {
        self.removed = true;
        remove_dir(&self.path)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = remove_dir(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "workspace cleanup on drop failed");
        }
    }
}

fn remove_dir(path: &Path) -> Result<(), BuildContextError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "workspace removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildContextError::Cleanup {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn validate_repository(repository: &str) -> Result<(), BuildContextError> {
    let trimmed = repository.trim_matches('/');
    let invalid = |reason| BuildContextError::InvalidName {
        value: repository.to_owned(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("repository is empty"));
    }
    if !Path::new(trimmed)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(invalid("repository must be a relative path without '..'"));
    }
    Ok(())
}

fn validate_build_id(build_id: &str) -> Result<(), BuildContextError> {
    let invalid = |reason| BuildContextError::InvalidName {
        value: build_id.to_owned(),
        reason,
    };

    if build_id.is_empty() {
        return Err(invalid("build id is empty"));
    }
    if build_id == "." || build_id == ".." || build_id.contains(['/', '\\']) {
        return Err(invalid("build id must be a single path segment"));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum BuildContextError {
    #[error("invalid workspace name {value:?}: {reason}")]
    InvalidName { value: String, reason: &'static str },
    #[error("failed to create directory {path}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to clean up workspace {path}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write Dockerfile at {path}")]
    WriteDockerfile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{field} must be a single line")]
    MultilineCommand { field: &'static str },
    #[error(transparent)]
    Eject(#[from] EjectError),
}
