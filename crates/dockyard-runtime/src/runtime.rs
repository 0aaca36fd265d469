use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dockyard_core::{DestinationBackend, ImageTag, Removal};
use tokio::sync::mpsc::UnboundedSender;

use crate::docker::DockerError;

/// Container operations of one compute backend.
///
/// "Does not exist" is reported as [`Removal::NotFound`] or `false`, never
/// as an error.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn image_exists(&self, image: &ImageTag) -> Result<bool, DockerError>;

    /// Build `image` from `context_dir`, forwarding build output to `output`.
    async fn build_image(
        &self,
        context_dir: &Path,
        dockerfile: &Path,
        image: &ImageTag,
        output: UnboundedSender<String>,
    ) -> Result<(), DockerError>;

    async fn remove_image(&self, image: &ImageTag) -> Result<Removal, DockerError>;

    /// Stop immediately, without a grace period.
    async fn stop_container(&self, name: &str) -> Result<Removal, DockerError>;

    async fn remove_container(&self, name: &str) -> Result<Removal, DockerError>;

    /// Start a detached container and return its id.
    async fn run_container(&self, spec: &ContainerSpec) -> Result<String, DockerError>;

    async fn network_exists(&self, network: &str) -> Result<bool, DockerError>;

    /// Create the network if missing. Returns whether it was created.
    async fn ensure_network(&self, network: &str) -> Result<bool, DockerError>;

    /// Run a throwaway container in the foreground and return its output.
    async fn run_to_completion(&self, spec: &ContainerSpec) -> Result<String, DockerError>;

    async fn server_version(&self) -> Result<String, DockerError>;
}

/// Opens a [`ContainerRuntime`] for a destination.
pub trait RuntimeConnector: Send + Sync {
    fn connect(&self, backend: &DestinationBackend) -> Arc<dyn ContainerRuntime>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    No,
    Always,
}

impl RestartPolicy {
    fn as_str(&self) -> &'static str {
        match self {
            RestartPolicy::No => "no",
            RestartPolicy::Always => "always",
        }
    }
}

/// Parameters of a `docker run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub network: Option<String>,
    pub restart: RestartPolicy,
    /// Remove the container once it exits.
    pub auto_remove: bool,
    /// `(host, container)` port pairs.
    pub ports: Vec<(u16, u16)>,
    /// `(host path, container path)` bind mounts.
    pub volumes: Vec<(String, String)>,
    /// Arguments passed to the image entrypoint.
    pub command: Vec<String>,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            network: None,
            restart: RestartPolicy::No,
            auto_remove: false,
            ports: Vec::new(),
            volumes: Vec::new(),
            command: Vec::new(),
        }
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn restart(mut self, policy: RestartPolicy) -> Self {
        self.restart = policy;
        self
    }

    pub fn auto_remove(mut self) -> Self {
        self.auto_remove = true;
        self
    }

    pub fn port(mut self, host: u16, container: u16) -> Self {
        self.ports.push((host, container));
        self
    }

    pub fn volume(mut self, host: impl Into<String>, container: impl Into<String>) -> Self {
        self.volumes.push((host.into(), container.into()));
        self
    }

    pub fn command<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command.extend(args.into_iter().map(Into::into));
        self
    }

    /// `docker run` arguments, without the detach flag.
    pub fn run_args(&self) -> Vec<String> {
        let mut args = vec!["run".to_owned(), "--name".to_owned(), self.name.clone()];
        if self.auto_remove {
            args.push("--rm".to_owned());
        }
        if let Some(network) = &self.network {
            args.push("--network".to_owned());
            args.push(network.clone());
        }
        if self.restart != RestartPolicy::No {
            args.push("--restart".to_owned());
            args.push(self.restart.as_str().to_owned());
        }
        for (host, container) in &self.ports {
            args.push("--publish".to_owned());
            args.push(format!("{host}:{container}"));
        }
        for (host, container) in &self.volumes {
            args.push("--volume".to_owned());
            args.push(format!("{host}:{container}"));
        }
        args
    }
}
