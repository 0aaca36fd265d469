mod deploy;
mod doctor;
mod eject;
mod fingerprint;
mod run;
mod worker;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use dockyard_core::DockyardConfig;
use dockyard_pipeline::{
    BuildOutcome, BuildStore, Collaborators, GitImporter, Orchestrator, Stage,
};
use dockyard_proxy::{DataPlaneApi, HaproxyClient};
use dockyard_runtime::{CertbotProvisioner, DockerConnector, RuntimeConnector};
use serde::de::DeserializeOwned;

pub use deploy::deploy;
pub use doctor::doctor;
pub use eject::eject;
pub use fingerprint::fingerprint;
pub use run::run;
pub use worker::worker;

/// Read a JSON record (job, application, destination, origin) from disk.
pub(crate) fn read_record<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid record in {}", path.display()))
}

/// Wire the orchestrator to the docker CLI, git, and the configured proxy.
pub(crate) fn orchestrator(config: &DockyardConfig, store: Arc<dyn BuildStore>) -> Orchestrator {
    let connector: Arc<dyn RuntimeConnector> =
        Arc::new(DockerConnector::new(config.runtime.docker_binary.clone()));

    let proxy = match HaproxyClient::new(&config.proxy) {
        Ok(client) => Some(Arc::new(client) as Arc<dyn DataPlaneApi>),
        Err(e) => {
            tracing::warn!(error = %e, "proxy control plane unavailable; routed builds will skip reconciliation");
            None
        }
    };

    Orchestrator::new(
        Collaborators {
            store,
            importer: Arc::new(GitImporter::default()),
            connector: Arc::clone(&connector),
            proxy,
            certificates: Arc::new(CertbotProvisioner::new(
                config.certificates.clone(),
                connector,
            )),
        },
        config,
    )
}

pub(crate) fn print_outcome(outcome: &BuildOutcome) {
    println!("Build {}: {}", outcome.build_id, outcome.status);
    if let Some(image) = &outcome.image {
        let action = if outcome.rebuilt { "built" } else { "reused" };
        println!("  image     {image} ({action})");
    }
    if outcome.deployed {
        println!("  instance  replaced");
    }
    for stage in &outcome.degraded {
        let name = match stage {
            Stage::Deploy => "deploy",
            Stage::Proxy => "proxy",
            Stage::Certificate => "certificate",
        };
        println!("  warning   {name} step failed; see the build log");
    }
}
