use std::path::PathBuf;

use crate::build::BuildStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("proxy password not configured; set {env_var} or [proxy].password in dockyard.toml")]
    MissingProxyPassword { env_var: String },

    #[error("build {build_id} is already {from}; cannot move to {to}")]
    InvalidTransition {
        build_id: String,
        from: BuildStatus,
        to: BuildStatus,
    },

    #[error("invalid domain {input:?}: {reason}")]
    InvalidDomain { input: String, reason: &'static str },

    #[error("unknown buildpack '{0}' (expected one of: node, static)")]
    UnknownBuildpack(String),

    #[error("application '{0}' has no repository configured")]
    MissingRepository(String),

    #[error("application '{0}' has no destination configured")]
    MissingDestination(String),

    #[error("application '{0}' has no source origin configured")]
    MissingSource(String),
}
