#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("docker CLI not found; install: https://docs.docker.com/engine/install/")]
    NotFound { source: std::io::Error },

    #[error("docker command failed: {args:?}\n{stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("docker output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },

    #[error("failed to read docker output")]
    Output { source: std::io::Error },
}

impl DockerError {
    /// The command failed because the named object does not exist.
    pub fn is_missing_object(&self) -> bool {
        match self {
            DockerError::CommandFailed { stderr, .. } => {
                let stderr = stderr.to_ascii_lowercase();
                stderr.contains("no such container")
                    || stderr.contains("no such image")
                    || stderr.contains("no such object")
                    || stderr.contains("no such network")
            }
            _ => false,
        }
    }
}
