use std::fmt;

use serde::{Deserialize, Serialize};

/// Local Docker daemon socket.
pub const DEFAULT_ENGINE: &str = "/var/run/docker.sock";

/// Compute backend flavour a destination runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// A single Docker engine, local or remote.
    #[default]
    SingleHost,
    /// Docker swarm across several hosts.
    Swarm,
    /// A managed Kubernetes cluster.
    Kubernetes,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::SingleHost => "single-host",
            BackendKind::Swarm => "swarm",
            BackendKind::Kubernetes => "kubernetes",
        })
    }
}

/// Where an application's containers run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationBackend {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: BackendKind,
    /// Socket path (`/var/run/docker.sock`) or remote endpoint (`ssh://host`, `tcp://host:2376`).
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Network every container of this destination is attached to.
    pub network: String,
    /// Whether the shared reverse proxy runs on this destination.
    #[serde(default)]
    pub proxy_managed: bool,
}

impl DestinationBackend {
    /// Value for the docker CLI's `--host` flag.
    pub fn docker_host(&self) -> String {
        let engine = self.engine.trim();
        if engine.starts_with('/') {
            format!("unix://{engine}")
        } else {
            engine.to_owned()
        }
    }
}

/// Source-control provider of a [`SourceOrigin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceProvider {
    GitHub,
    GitLab,
}

impl SourceProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            SourceProvider::GitHub => "https://github.com",
            SourceProvider::GitLab => "https://gitlab.com",
        }
    }

    /// User name paired with an access token in HTTPS clone URLs.
    pub fn token_user(&self) -> &'static str {
        match self {
            SourceProvider::GitHub => "x-access-token",
            SourceProvider::GitLab => "oauth2",
        }
    }
}

/// A source-control account repositories are imported from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOrigin {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", alias = "provider")]
    pub provider: SourceProvider,
    /// Overrides the provider's public host (self-hosted instances, mirrors).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the access token.
    #[serde(default)]
    pub credential_env: Option<String>,
}

impl SourceOrigin {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.provider.default_base_url())
    }
}

fn default_engine() -> String {
    DEFAULT_ENGINE.to_owned()
}
