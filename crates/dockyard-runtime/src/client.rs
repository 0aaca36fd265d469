use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dockyard_core::{DestinationBackend, ImageTag, Removal};
use tokio::sync::mpsc::UnboundedSender;

use crate::docker::DockerError;
use crate::executor::{DockerExecutor, RealExecutor};
use crate::runtime::{ContainerRuntime, ContainerSpec, RuntimeConnector};

/// Docker engine operations, parameterized over the executor for testability.
pub struct DockerClient<E: DockerExecutor = RealExecutor> {
    executor: E,
}

impl DockerClient<RealExecutor> {
    /// Client for the engine a destination points at.
    pub fn for_backend(binary: &str, backend: &DestinationBackend) -> Self {
        Self {
            executor: RealExecutor::new(binary).with_host(backend.docker_host()),
        }
    }
}

impl Default for DockerClient<RealExecutor> {
    fn default() -> Self {
        Self {
            executor: RealExecutor::default(),
        }
    }
}

impl<E: DockerExecutor> DockerClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Map a "no such object" failure to [`Removal::NotFound`].
    async fn exec_removal(&self, args: Vec<String>) -> Result<Removal, DockerError> {
        match self.executor.exec(&args).await {
            Ok(_) => Ok(Removal::Removed),
            Err(e) if e.is_missing_object() => Ok(Removal::NotFound),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<E: DockerExecutor> ContainerRuntime for DockerClient<E> {
    // ── Images ──

    async fn image_exists(&self, image: &ImageTag) -> Result<bool, DockerError> {
        let tag = image.to_string();
        match self
            .executor
            .exec(&args(["image", "inspect", "--format", "{{.Id}}", &tag]))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_missing_object() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn build_image(
        &self,
        context_dir: &Path,
        dockerfile: &Path,
        image: &ImageTag,
        output: UnboundedSender<String>,
    ) -> Result<(), DockerError> {
        let tag = image.to_string();
        let dockerfile = dockerfile.to_string_lossy();
        let context = context_dir.to_string_lossy();

        self.executor
            .exec_streaming(
                &args([
                    "build",
                    "--tag",
                    &tag,
                    "--file",
                    &dockerfile,
                    "--progress",
                    "plain",
                    &context,
                ]),
                output,
            )
            .await
    }

    async fn remove_image(&self, image: &ImageTag) -> Result<Removal, DockerError> {
        let tag = image.to_string();
        self.exec_removal(args(["image", "rm", "--force", &tag])).await
    }

    // ── Containers ──

    async fn stop_container(&self, name: &str) -> Result<Removal, DockerError> {
        self.exec_removal(args(["stop", "--time", "0", name])).await
    }

    async fn remove_container(&self, name: &str) -> Result<Removal, DockerError> {
        self.exec_removal(args(["rm", name])).await
    }

    async fn run_container(&self, spec: &ContainerSpec) -> Result<String, DockerError> {
        let mut cmd = spec.run_args();
        cmd.push("--detach".to_owned());
        cmd.push(spec.image.clone());
        cmd.extend(spec.command.iter().cloned());

        let output = self.executor.exec(&cmd).await?;
        Ok(output.trim().to_owned())
    }

    async fn run_to_completion(&self, spec: &ContainerSpec) -> Result<String, DockerError> {
        let mut cmd = spec.run_args();
        cmd.push(spec.image.clone());
        cmd.extend(spec.command.iter().cloned());

        self.executor.exec(&cmd).await
    }

    // ── Networks ──

    async fn network_exists(&self, network: &str) -> Result<bool, DockerError> {
        match self
            .executor
            .exec(&args(["network", "inspect", "--format", "{{.Name}}", network]))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_missing_object() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn ensure_network(&self, network: &str) -> Result<bool, DockerError> {
        if self.network_exists(network).await? {
            return Ok(false);
        }

        self.executor
            .exec(&args(["network", "create", "--attachable", network]))
            .await?;
        tracing::info!(network, "network created");
        Ok(true)
    }

    // ── Engine ──

    async fn server_version(&self) -> Result<String, DockerError> {
        let output = self
            .executor
            .exec(&args(["version", "--format", "{{.Server.Version}}"]))
            .await?;
        Ok(output.trim().to_owned())
    }
}

/// Connects to destinations through the docker CLI.
#[derive(Debug, Clone)]
pub struct DockerConnector {
    binary: String,
}

impl DockerConnector {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl RuntimeConnector for DockerConnector {
    fn connect(&self, backend: &DestinationBackend) -> Arc<dyn ContainerRuntime> {
        Arc::new(DockerClient::for_backend(&self.binary, backend))
    }
}

// ── Helper ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}
