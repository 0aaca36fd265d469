use std::path::Path;
use std::sync::Arc;

use dockyard_core::{BuildJob, BuildStatus, DockyardConfig};
use dockyard_pipeline::MemoryStore;

/// Run a single job payload to completion.
///
/// The job carries everything the build needs; the application record it
/// came from is not updated.
pub async fn run(config_dir: &Path, job_path: &Path) -> anyhow::Result<()> {
    let config = DockyardConfig::load(config_dir)?;
    let job: BuildJob = super::read_record(job_path)?;

    let store = Arc::new(MemoryStore::new());
    let orchestrator = super::orchestrator(&config, store);
    let outcome = orchestrator.run(job).await?;

    super::print_outcome(&outcome);
    if outcome.status == BuildStatus::Failed {
        anyhow::bail!("build {} failed", outcome.build_id);
    }
    Ok(())
}
