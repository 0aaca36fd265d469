use dockyard_core::{BackendKind, DestinationBackend, ImageTag, Removal};

use crate::docker::DockerError;
use crate::runtime::{ContainerRuntime, ContainerSpec, RestartPolicy};

/// Result of a best-effort cleanup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupStep {
    Done(Removal),
    /// The step failed and was skipped.
    Failed(String),
}

impl CleanupStep {
    fn from_result(result: Result<Removal, DockerError>) -> Self {
        match result {
            Ok(removal) => CleanupStep::Done(removal),
            Err(e) => CleanupStep::Failed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub stop: CleanupStep,
    pub remove: CleanupStep,
    pub network_created: bool,
    pub container_id: String,
}

impl DeployReport {
    /// A previous instance was found and taken down.
    pub fn replaced_previous(&self) -> bool {
        matches!(self.remove, CleanupStep::Done(Removal::Removed))
    }
}

/// Replaces the running instance of an application on its destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeploymentManager;

impl DeploymentManager {
    pub fn new() -> Self {
        Self
    }

    /// Stop and remove the instance named `app_id`, then start a fresh one
    /// from `image`.
    ///
    /// Stop/remove are best effort: their failures are reported in the
    /// [`DeployReport`] and the new instance is started regardless.
    pub async fn deploy(
        &self,
        runtime: &dyn ContainerRuntime,
        backend: &DestinationBackend,
        app_id: &str,
        image: &ImageTag,
    ) -> Result<DeployReport, DeployError> {
        match backend.kind {
            BackendKind::SingleHost => self.deploy_single_host(runtime, backend, app_id, image).await,
            kind @ (BackendKind::Swarm | BackendKind::Kubernetes) => {
                Err(DeployError::Unsupported { kind })
            }
        }
    }

    async fn deploy_single_host(
        &self,
        runtime: &dyn ContainerRuntime,
        backend: &DestinationBackend,
        app_id: &str,
        image: &ImageTag,
    ) -> Result<DeployReport, DeployError> {
        let stop = CleanupStep::from_result(runtime.stop_container(app_id).await);
        if let CleanupStep::Failed(error) = &stop {
            tracing::warn!(container = app_id, %error, "stopping previous instance failed");
        }
        let remove = CleanupStep::from_result(runtime.remove_container(app_id).await);
        if let CleanupStep::Failed(error) = &remove {
            tracing::warn!(container = app_id, %error, "removing previous instance failed");
        }

        let network_created = runtime
            .ensure_network(&backend.network)
            .await
            .map_err(|e| DeployError::Network {
                network: backend.network.clone(),
                source: e,
            })?;

        let spec = ContainerSpec::new(app_id, image.to_string())
            .network(backend.network.clone())
            .restart(RestartPolicy::Always);
        let container_id = runtime
            .run_container(&spec)
            .await
            .map_err(|e| DeployError::Start {
                name: app_id.to_owned(),
                source: e,
            })?;

        tracing::info!(container = app_id, image = %image, backend = %backend.id, "instance started");
        Ok(DeployReport {
            stop,
            remove,
            network_created,
            container_id,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("deploying to {kind} backends is not supported yet")]
    Unsupported { kind: BackendKind },

    #[error("failed to ensure network {network}")]
    Network { network: String, source: DockerError },

    #[error("failed to start container {name}")]
    Start { name: String, source: DockerError },
}
