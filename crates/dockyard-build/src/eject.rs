use std::path::{Path, PathBuf};

/// Directory, relative to a repository root, holding ejected build files.
pub const EJECT_DIR: &str = ".dockyard";

/// Writes the generated Dockerfile into the repository.
///
/// Once committed, every build of the repository uses
/// `.dockyard/Dockerfile` instead of generating one.
pub fn eject(project_dir: &Path, dockerfile_content: &str) -> Result<PathBuf, EjectError> {
    let eject_dir = project_dir.join(EJECT_DIR);
    std::fs::create_dir_all(&eject_dir).map_err(|e| EjectError::CreateDir {
        path: eject_dir.clone(),
        source: e,
    })?;

    let dockerfile_path = eject_dir.join("Dockerfile");
    if dockerfile_path.exists() {
        return Err(EjectError::AlreadyEjected(dockerfile_path));
    }

    std::fs::write(&dockerfile_path, dockerfile_content).map_err(|e| EjectError::Write {
        path: dockerfile_path.clone(),
        source: e,
    })?;

    Ok(dockerfile_path)
}

/// Check if the repository carries an ejected Dockerfile.
pub fn is_ejected(project_dir: &Path) -> bool {
    ejected_dockerfile_path(project_dir).is_file()
}

/// Load ejected Dockerfile content.
pub fn load_ejected_dockerfile(project_dir: &Path) -> Result<String, EjectError> {
    let path = ejected_dockerfile_path(project_dir);
    std::fs::read_to_string(&path).map_err(|e| EjectError::Read { path, source: e })
}

fn ejected_dockerfile_path(project_dir: &Path) -> PathBuf {
    project_dir.join(EJECT_DIR).join("Dockerfile")
}

#[derive(Debug, thiserror::Error)]
pub enum EjectError {
    #[error("failed to create .dockyard directory at {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("build config already ejected at {0}; edit it directly or delete it to re-eject")]
    AlreadyEjected(PathBuf),
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read ejected Dockerfile at {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
