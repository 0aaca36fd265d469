use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use dockyard_core::{Application, BuildStatus, DestinationBackend, DockyardConfig, SourceOrigin};
use dockyard_pipeline::{BuildStore, MemoryStore};

/// Queue and run a deployment of an application record.
///
/// The record is written back afterwards so the stored fingerprint and the
/// pending previous domain carry over to the next deployment.
pub async fn deploy(
    config_dir: &Path,
    application_path: &Path,
    destination_path: &Path,
    source_path: &Path,
) -> anyhow::Result<()> {
    let config = DockyardConfig::load(config_dir)?;
    let mut application: Application = super::read_record(application_path)?;
    let destination: DestinationBackend = super::read_record(destination_path)?;
    let origin: SourceOrigin = super::read_record(source_path)?;

    let build_id = uuid::Uuid::new_v4().to_string();
    let job = application.prepare_job(&build_id, &destination, &origin)?;

    let store = Arc::new(MemoryStore::new());
    store.save_application(&application).await?;

    println!("Deploying {} ({build_id})...", application.name);
    let orchestrator = super::orchestrator(&config, store.clone());
    let outcome = orchestrator.run(job).await?;

    let updated = store
        .find_application(&application.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("application {} vanished from the store", application.id))?;
    let content = serde_json::to_string_pretty(&updated)?;
    std::fs::write(application_path, content + "\n")
        .with_context(|| format!("failed to write {}", application_path.display()))?;

    super::print_outcome(&outcome);
    if outcome.status == BuildStatus::Failed {
        anyhow::bail!("build {build_id} failed");
    }
    Ok(())
}
